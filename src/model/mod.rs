//! Types that represent the core data model, such as `Transaction`, `Category` and `Budget`.
mod amount;
mod budget;
mod category;
mod transaction;

pub use amount::{Amount, AmountFormat};
pub use budget::{over_threshold, warning_threshold, Budget, BudgetStatus, BudgetUsage};
pub use category::{Categories, Category, CategoryGroup};
pub use transaction::{Transaction, GENERAL_CATEGORY};

use serde::{Deserialize, Serialize};

/// Whether money came in or went out.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

impl TransactionKind {
    /// Lenient parse used for model output: surrounding whitespace and case are ignored. Returns
    /// `None` for anything that is not `income` or `expense`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        s.trim().to_lowercase().parse().ok()
    }
}

/// Everything the store holds.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MoneyData {
    #[serde(default)]
    pub(crate) transactions: Vec<Transaction>,
    #[serde(default)]
    pub(crate) categories: Categories,
    #[serde(default)]
    pub(crate) budgets: Vec<Budget>,
}
