//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{Amount, Budget, Category, Transaction, TransactionKind};
use crate::store::{FileStore, Store};
use crate::Config;
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Test environment that sets up a moneymanager home directory with a `Config`.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with default settings and no stored data.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("moneymanager");
        let config = Config::create(&root, None, None).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Opens the data file the way a command would.
    pub async fn store(&self) -> FileStore {
        FileStore::open(self.config.data_path()).await.unwrap()
    }

    /// Stores an expense of `amount` in `category` dated `date`.
    pub async fn add_expense(
        &self,
        category: &str,
        amount: i64,
        date: DateTime<Utc>,
    ) -> Transaction {
        self.add_transaction(TransactionKind::Expense, category, amount, date)
            .await
    }

    pub async fn add_transaction(
        &self,
        kind: TransactionKind,
        category: &str,
        amount: i64,
        date: DateTime<Utc>,
    ) -> Transaction {
        let t = Transaction::new(
            Amount::new(Decimal::from(amount)),
            kind,
            category,
            format!("{category} {amount}"),
            date,
        );
        self.store().await.add_transaction(t).await.unwrap()
    }

    /// Stores a budget for `category` over `[start, end]`.
    pub async fn add_budget(
        &self,
        category: &str,
        allocated: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Budget {
        let budget = Budget::new(category, Amount::new(Decimal::from(allocated)), start, end);
        self.store().await.save_budget(budget).await.unwrap()
    }

    pub async fn add_category(&self, name: &str, kind: TransactionKind) -> Category {
        self.store()
            .await
            .add_category(Category::new(name, kind))
            .await
            .unwrap()
    }
}

/// The first and last day of the current UTC month.
pub fn this_month() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    let start = today.with_day(1).unwrap();
    let end = start
        .checked_add_months(Months::new(1))
        .unwrap()
        .pred_opt()
        .unwrap();
    (start, end)
}
