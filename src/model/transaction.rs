use crate::model::{Amount, TransactionKind};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The category name used when no known category can be matched. It never needs a row in the
/// category table.
pub const GENERAL_CATEGORY: &str = "General";

/// A single income or expense.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) amount: Amount,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionKind,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) date: DateTime<Utc>,
    /// Cached from `date` so that month queries do not need to parse timestamps.
    pub(crate) month: u32,
    /// Cached from `date`.
    pub(crate) year: i32,
}

impl Transaction {
    /// Creates a transaction with a freshly generated id. `month` and `year` are derived from
    /// `date`.
    pub fn new(
        amount: Amount,
        kind: TransactionKind,
        category: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_transaction_id(),
            amount,
            kind,
            category: category.into(),
            description: description.into(),
            date,
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Changes the timestamp and keeps the cached month and year in step.
    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
        self.month = date.month();
        self.year = date.year();
    }
}

/// Generates a unique transaction id.
pub(crate) fn generate_transaction_id() -> String {
    format!("txn-{}", Uuid::new_v4().simple())
}
