use crate::model::{Amount, Transaction, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Income, expense and the biggest expense categories for one calendar month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthlySummary {
    year: i32,
    month: u32,
    income: Amount,
    expense: Amount,
    balance: Amount,
    top_expenses: Vec<(String, Amount)>,
}

impl MonthlySummary {
    /// Uses the cached `year`/`month` of each transaction. The top expense categories are the three
    /// largest by total; equal totals are ordered by category name.
    pub fn compute(transactions: &[Transaction], year: i32, month: u32) -> Self {
        let in_month = || {
            transactions
                .iter()
                .filter(move |t| t.year() == year && t.month() == month)
        };
        let total = |kind: TransactionKind| -> Decimal {
            in_month()
                .filter(|t| t.kind() == kind)
                .map(|t| t.amount().value())
                .fold(Decimal::ZERO, Decimal::saturating_add)
        };
        let income = total(TransactionKind::Income);
        let expense = total(TransactionKind::Expense);

        let mut by_category: HashMap<&str, Decimal> = HashMap::new();
        for t in in_month().filter(|t| t.is_expense()) {
            let sum = by_category.entry(t.category()).or_default();
            *sum = sum.saturating_add(t.amount().value());
        }
        let mut top: Vec<(&str, Decimal)> = by_category.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Self {
            year,
            month,
            income: Amount::new(income),
            expense: Amount::new(expense),
            balance: Amount::new(income.saturating_sub(expense)),
            top_expenses: top
                .into_iter()
                .take(3)
                .map(|(c, v)| (c.to_string(), Amount::new(v)))
                .collect(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn income(&self) -> Amount {
        self.income
    }

    pub fn expense(&self) -> Amount {
        self.expense
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn top_expenses(&self) -> &[(String, Amount)] {
        &self.top_expenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(kind: TransactionKind, category: &str, amount: i64, month: u32) -> Transaction {
        Transaction::new(
            Amount::new(Decimal::from(amount)),
            kind,
            category,
            "",
            Utc.with_ymd_and_hms(2025, month, 5, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_compute() {
        let transactions = vec![
            t(TransactionKind::Income, "Salary", 15_000_000, 10),
            t(TransactionKind::Expense, "Food & Drinks", 30_000, 10),
            t(TransactionKind::Expense, "Food & Drinks", 70_000, 10),
            t(TransactionKind::Expense, "Rent", 3_000_000, 10),
            t(TransactionKind::Expense, "Transportation", 50_000, 10),
            t(TransactionKind::Expense, "Shopping", 10_000, 10),
            t(TransactionKind::Expense, "Rent", 3_000_000, 9),
        ];
        let summary = MonthlySummary::compute(&transactions, 2025, 10);
        assert_eq!(summary.income().value(), Decimal::from(15_000_000));
        assert_eq!(summary.expense().value(), Decimal::from(3_160_000));
        assert_eq!(summary.balance().value(), Decimal::from(11_840_000));
        let names: Vec<&str> = summary
            .top_expenses()
            .iter()
            .map(|(c, _)| c.as_str())
            .collect();
        assert_eq!(names, vec!["Rent", "Food & Drinks", "Transportation"]);
    }

    #[test]
    fn test_empty_month() {
        let summary = MonthlySummary::compute(&[], 2025, 1);
        assert!(summary.income().is_zero());
        assert!(summary.top_expenses().is_empty());
    }
}
