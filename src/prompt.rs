//! Builds the instructions that are sent to the text-completion model.
//!
//! Amount units and income/expense classification are not parsed locally. They are described to
//! the model here, together with worked examples, and the model's interpretation is taken as is.

use crate::summary::MonthlySummary;
use crate::utils::same_name;
use std::fmt::Write;

/// Categories that are always offered to the model, after the caller's own.
pub const GENERIC_CATEGORIES: [&str; 5] = ["General", "Salary", "Bonus", "Food & Drinks", "Shopping"];

/// Unit words and the multiplier they stand for.
pub const UNIT_RULES: [(&str, &str); 4] = [
    ("\"k\", \"nghìn\", \"ng\"", "x 1,000"),
    ("\"m\", \"tr\", \"triệu\", \"củ\"", "x 1,000,000"),
    ("\"lít\"", "x 100,000"),
    ("\"tỷ\"", "x 1,000,000,000"),
];

/// Words that mark money coming in.
pub const INCOME_WORDS: [&str; 16] = [
    "nhận", "lương", "thưởng", "lãi", "bán", "được cho", "biếu", "hoàn tiền", "thu", "receive",
    "salary", "bonus", "interest", "sell", "gift", "refund",
];

/// Words that mark money going out.
pub const EXPENSE_WORDS: [&str; 17] = [
    "mua", "trả", "đóng", "nạp", "đi chợ", "ăn", "uống", "sắm", "tốn", "chi", "buy", "pay",
    "top up", "go to market", "eat", "drink", "spend",
];

/// `(input, expected JSON)` pairs embedded in every extraction prompt. The offline completion
/// client answers from the same table.
pub const WORKED_EXAMPLES: [(&str, &str); 5] = [
    (
        "nhận lương 15tr",
        r#"{"amount": 15000000, "type": "income", "category": "Salary", "description": "Lương tháng"}"#,
    ),
    (
        "bán đồ cũ 500k",
        r#"{"amount": 500000, "type": "income", "category": "Other Income", "description": "Bán đồ cũ"}"#,
    ),
    (
        "cafe 30k",
        r#"{"amount": 30000, "type": "expense", "category": "Food & Drinks", "description": "Cafe"}"#,
    ),
    (
        "đóng tiền điện 1 củ",
        r#"{"amount": 1000000, "type": "expense", "category": "Bills & Utilities", "description": "Tiền điện"}"#,
    ),
    (
        "đổ xăng 50",
        r#"{"amount": 50000, "type": "expense", "category": "Transportation", "description": "Đổ xăng"}"#,
    ),
];

/// The line that carries the user's text. The offline completion client looks for it.
pub(crate) const INPUT_PREFIX: &str = "INPUT: ";

/// Known category names followed by the generic ones, without case-insensitive duplicates, in
/// first-seen order.
pub fn offered_categories<'a>(known: &[&'a str]) -> Vec<&'a str> {
    let generic: &[&'a str] = &GENERIC_CATEGORIES;
    let mut offered: Vec<&'a str> = Vec::new();
    for name in known.iter().chain(generic).copied() {
        if name.trim().is_empty() || offered.iter().any(|o| same_name(o, name)) {
            continue;
        }
        offered.push(name);
    }
    offered
}

/// Builds the extraction prompt for `input`. The output depends only on the arguments.
pub fn build_extraction_prompt(input: &str, known_categories: &[&str]) -> String {
    let mut p = String::new();
    p.push_str("You extract financial transactions from short Vietnamese or English notes.\n\n");
    let _ = writeln!(p, "{INPUT_PREFIX}\"{}\"", input.trim());
    let _ = writeln!(
        p,
        "CATEGORIES: [{}]\n",
        offered_categories(known_categories).join(", ")
    );
    p.push_str(
        "TASK: Return exactly one JSON object with the fields \"amount\", \"type\", \"category\", \
         \"description\". If the text is not a transaction, return {\"amount\": null}.\n\n",
    );

    p.push_str("1. TYPE RULES\n");
    let _ = writeln!(
        p,
        "   - \"income\" when the text contains any of: {}.",
        quoted(&INCOME_WORDS)
    );
    let _ = writeln!(
        p,
        "   - \"expense\" when the text contains any of: {}.",
        quoted(&EXPENSE_WORDS)
    );
    p.push_str(
        "   - Otherwise decide by meaning: money coming in (salary, bonus) is \"income\", \
         consumption (coffee, fuel, electricity, water) is \"expense\".\n\n",
    );

    p.push_str("2. AMOUNT RULES\n");
    for (units, multiplier) in UNIT_RULES {
        let _ = writeln!(p, "   - {units} -> {multiplier}");
    }
    p.push_str(
        "   - A bare two-digit number with no unit for a small expense means thousands \
         (\"50\" -> 50000).\n\n",
    );

    p.push_str(
        "3. CATEGORY: pick the closest name from CATEGORIES. If none fits, use \"General\".\n\n",
    );

    p.push_str("EXAMPLES:\n");
    for (example_input, json) in WORKED_EXAMPLES {
        let _ = writeln!(p, "User: \"{example_input}\" -> JSON: {json}");
    }
    p.push_str("\nRETURN ONLY JSON:");
    p
}

/// Builds the prompt for a free-form question about this month's finances. The answer is
/// requested as plain text.
pub fn build_advisor_prompt(summary: &MonthlySummary, question: &str) -> String {
    let mut p = String::new();
    p.push_str("You are a friendly, professional personal finance advisor.\n\n");
    let _ = writeln!(
        p,
        "THE USER'S FINANCES FOR {:04}-{:02}:",
        summary.year(),
        summary.month()
    );
    let _ = writeln!(p, "- Total income: {}", summary.income());
    let _ = writeln!(p, "- Total expense: {}", summary.expense());
    let _ = writeln!(p, "- Balance: {}", summary.balance());
    if summary.top_expenses().is_empty() {
        p.push_str("- Top expenses: no data yet\n");
    } else {
        let top: Vec<String> = summary
            .top_expenses()
            .iter()
            .map(|(category, amount)| format!("{category}: {amount}"))
            .collect();
        let _ = writeln!(p, "- Top expenses: {}", top.join(", "));
    }
    let _ = writeln!(p, "\nQUESTION: \"{}\"\n", question.trim());
    p.push_str(
        "TASK:\n\
         - Answer the question or give advice based on the figures above.\n\
         - Be polite and concise.\n\
         - Do NOT return JSON. Answer in plain text.\n",
    );
    p
}

fn quoted(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| format!("\"{w}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_input_and_categories() {
        let prompt = build_extraction_prompt("cafe 30k", &["Food & Drinks", "Transportation"]);
        assert!(prompt.contains("INPUT: \"cafe 30k\""));
        assert!(prompt.contains(
            "CATEGORIES: [Food & Drinks, Transportation, General, Salary, Bonus, Shopping]"
        ));
        assert!(prompt.contains("\"amount\", \"type\", \"category\", \"description\""));
        assert!(prompt.contains("\"tỷ\" -> x 1,000,000,000"));
        assert!(prompt.contains("\"lít\" -> x 100,000"));
        for (input, _) in WORKED_EXAMPLES {
            assert!(prompt.contains(input));
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_extraction_prompt("đổ xăng 50", &["Transportation"]);
        let b = build_extraction_prompt("đổ xăng 50", &["Transportation"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_offered_categories_dedup() {
        let offered = offered_categories(&["salary", "Rent", "", "rent"]);
        assert_eq!(
            offered,
            vec!["salary", "Rent", "General", "Bonus", "Food & Drinks", "Shopping"]
        );
    }

    #[test]
    fn test_advisor_prompt() {
        let summary = MonthlySummary::compute(&[], 2025, 10);
        let prompt = build_advisor_prompt(&summary, " Should I save more? ");
        assert!(prompt.contains("2025-10"));
        assert!(prompt.contains("QUESTION: \"Should I save more?\""));
        assert!(prompt.contains("no data yet"));
        assert!(prompt.contains("Do NOT return JSON"));
    }
}
