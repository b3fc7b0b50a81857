//! The persistence collaborator. Stored data is exposed as live sequences so that the aggregator can
//! react to every change.

mod file;

use crate::error::Res;
use crate::live::BoxedSequence;
use crate::model::{Budget, Category, Transaction};
use chrono::NaiveDate;

pub use file::FileStore;

/// Reads and writes transactions, categories and budgets. Every method fails with an error that
/// carries a human-readable message.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Stores a new transaction and returns it as stored.
    async fn add_transaction(&self, transaction: Transaction) -> Res<Transaction>;

    /// Replaces the transaction that has the same id.
    async fn update_transaction(&self, transaction: Transaction) -> Res<Transaction>;

    async fn delete_transaction(&self, id: &str) -> Res<()>;

    /// Every transaction, re-emitted whenever the list changes. The first value is the current
    /// list.
    fn transactions(&self) -> BoxedSequence<Vec<Transaction>>;

    /// The budgets whose window contains `as_of`, re-emitted whenever the budget list changes.
    fn budgets(&self, as_of: NaiveDate) -> BoxedSequence<Vec<Budget>>;

    async fn categories(&self) -> Res<Vec<Category>>;

    /// Validates and stores a new category. See `Categories::add` for the rules.
    async fn add_category(&self, category: Category) -> Res<Category>;

    /// Inserts the budget, or replaces the one with the same id.
    async fn save_budget(&self, budget: Budget) -> Res<Budget>;

    async fn delete_budget(&self, id: &str) -> Res<()>;
}
