//! Turns the raw text returned by the completion model into an `ExtractedTransaction`.

use crate::model::{Amount, TransactionKind};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Why a completion could not be read as structured data at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("the response does not contain a JSON object")]
    NoJsonObject,
    #[error("the JSON object in the response is invalid: {0}")]
    InvalidJson(String),
}

/// What the model extracted. Every field is optional; a missing or non-positive amount means the
/// text was not a transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedTransaction {
    pub amount: Option<Amount>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl ExtractedTransaction {
    pub fn is_transaction(&self) -> bool {
        self.amount.is_some_and(|a| a.is_positive())
    }

    /// The parsed kind. Anything missing or unrecognised counts as an expense.
    pub fn kind(&self) -> TransactionKind {
        self.kind
            .as_deref()
            .and_then(TransactionKind::parse_lenient)
            .unwrap_or_default()
    }
}

/// Parses the first balanced JSON object found in `raw`. Text before and after it is ignored.
///
/// Fields that are absent, `null` or of an unusable type become `None`. A string `amount` such as
/// `"30000"` or `"30,000"` is coerced to a number.
pub fn parse(raw: &str) -> Result<ExtractedTransaction, ParseError> {
    let object = first_object(raw).ok_or(ParseError::NoJsonObject)?;
    let map: Map<String, Value> =
        serde_json::from_str(object).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    Ok(ExtractedTransaction {
        amount: map.get("amount").and_then(amount),
        kind: text(map.get("type")),
        category: text(map.get("category")),
        description: text(map.get("description")),
    })
}

fn amount(value: &Value) -> Option<Amount> {
    match value {
        Value::Number(n) => {
            let d = match n.as_i64() {
                Some(i) => Decimal::from(i),
                None => Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))?,
            };
            Some(Amount::new(d))
        }
        Value::String(s) => Amount::from_str(s)
            .ok()
            .filter(|_| !s.trim().is_empty())
            .map(|a| Amount::new(a.value())),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Finds the first `{` and returns the slice up to its matching `}`. Braces inside JSON strings are
/// skipped.
fn first_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let parsed = parse(
            r#"{"amount": 30000, "type": "expense", "category": "Food & Drinks", "description": "Cafe"}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount.unwrap().value(), Decimal::from(30000));
        assert_eq!(parsed.kind(), TransactionKind::Expense);
        assert_eq!(parsed.category.as_deref(), Some("Food & Drinks"));
        assert_eq!(parsed.description.as_deref(), Some("Cafe"));
        assert!(parsed.is_transaction());
    }

    #[test]
    fn test_surrounding_text_and_braces_in_strings() {
        let raw = "Sure! Here it is:\n```json\n{\"amount\": \"15,000,000\", \"type\": \"Income\", \
                   \"category\": \"Salary\", \"description\": \"pay {october}\"}\n```\nAnything else? {}";
        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.amount.unwrap().value(), Decimal::from(15_000_000));
        assert_eq!(parsed.kind(), TransactionKind::Income);
        assert_eq!(parsed.description.as_deref(), Some("pay {october}"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let parsed = parse(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(parsed.amount.unwrap().value(), Decimal::new(125, 1));
        assert_eq!(parsed.kind, None);
        assert_eq!(parsed.kind(), TransactionKind::Expense);
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn test_not_a_transaction() {
        for raw in [
            r#"{"amount": null, "type": null}"#,
            r#"{"amount": 0}"#,
            r#"{"amount": -5}"#,
            r#"{"amount": "lots"}"#,
            r#"{"category": "General"}"#,
        ] {
            let parsed = parse(raw).unwrap();
            assert!(!parsed.is_transaction(), "{raw}");
        }
    }

    #[test]
    fn test_wrong_types_become_none() {
        let parsed = parse(r#"{"amount": 1, "type": 3, "category": ["x"], "description": ""}"#)
            .unwrap();
        assert_eq!(parsed.kind, None);
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn test_no_object() {
        assert_eq!(
            parse("Hello! How can I help you today?"),
            Err(ParseError::NoJsonObject)
        );
        assert_eq!(parse("{\"amount\": 1"), Err(ParseError::NoJsonObject));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse("{amount: 1}"),
            Err(ParseError::InvalidJson(_))
        ));
        assert!(matches!(parse("{\"a\": [1, }"), Err(_)));
    }
}
