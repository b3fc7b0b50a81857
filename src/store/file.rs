use crate::error::Res;
use crate::live::{BoxedSequence, Filtered};
use crate::model::{Budget, Category, MoneyData, Transaction};
use crate::store::Store;
use crate::utils;
use anyhow::{bail, ensure, Context};
use chrono::NaiveDate;
use std::path::PathBuf;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// A `Store` that keeps everything in memory, publishes changes through `watch` channels and
/// mirrors the data to a JSON file.
///
/// A change that cannot be written to the file is undone in memory before the error is returned,
/// so subscribers never see data that was not saved.
#[derive(Debug)]
pub struct FileStore {
    path: Option<PathBuf>,
    state: Mutex<MoneyData>,
    transactions: watch::Sender<Vec<Transaction>>,
    budgets: watch::Sender<Vec<Budget>>,
}

impl FileStore {
    /// Opens the store backed by `path`. A missing file means an empty store; the file is created on
    /// the first change.
    pub async fn open(path: impl Into<PathBuf>) -> Res<Self> {
        let path = path.into();
        let data = if path.is_file() {
            utils::deserialize::<MoneyData>(&path)
                .await
                .context("Unable to load the stored data")?
        } else {
            debug!("No data file at {}, starting empty", path.display());
            MoneyData::default()
        };
        Ok(Self::build(Some(path), data))
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::build(None, MoneyData::default())
    }

    fn build(path: Option<PathBuf>, data: MoneyData) -> Self {
        let (transactions, _) = watch::channel(data.transactions.clone());
        let (budgets, _) = watch::channel(data.budgets.clone());
        Self {
            path,
            state: Mutex::new(data),
            transactions,
            budgets,
        }
    }

    /// A copy of everything that is stored.
    pub async fn data(&self) -> MoneyData {
        self.state.lock().await.clone()
    }

    /// Reads the file again and publishes whatever changed since it was last read or written.
    /// Another process may have written it. Does nothing for an in-memory store.
    pub async fn reload(&self) -> Res<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.is_file() {
            return Ok(());
        }
        let fresh = utils::deserialize::<MoneyData>(path)
            .await
            .context("Unable to reload the stored data")?;
        let mut state = self.state.lock().await;
        if *state != fresh {
            debug!("Stored data changed on disk, publishing");
            *state = fresh;
            self.publish(&state);
        }
        Ok(())
    }

    /// Applies `change` to the data, writes it and publishes it. If either `change` or the write
    /// fails, the data is left as it was.
    async fn mutate<T, F>(&self, change: F) -> Res<T>
    where
        F: FnOnce(&mut MoneyData) -> Res<T> + Send,
        T: Send,
    {
        let mut state = self.state.lock().await;
        let before = state.clone();
        let out = change(&mut state)?;
        if let Err(e) = self.persist(&state).await {
            warn!("Unable to save changes, rolling back: {e:#}");
            *state = before;
            return Err(e);
        }
        self.publish(&state);
        Ok(out)
    }

    async fn persist(&self, data: &MoneyData) -> Res<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data).context("Unable to serialize the data")?;
        utils::write_atomic(path, json)
            .await
            .with_context(|| format!("Unable to save data to {}", path.display()))
    }

    fn publish(&self, data: &MoneyData) {
        self.transactions.send_if_modified(|current| {
            if *current == data.transactions {
                return false;
            }
            current.clone_from(&data.transactions);
            true
        });
        self.budgets.send_if_modified(|current| {
            if *current == data.budgets {
                return false;
            }
            current.clone_from(&data.budgets);
            true
        });
    }
}

#[async_trait::async_trait]
impl Store for FileStore {
    async fn add_transaction(&self, transaction: Transaction) -> Res<Transaction> {
        ensure!(
            transaction.amount().is_positive(),
            "A transaction amount must be positive, got {}",
            transaction.amount()
        );
        self.mutate(|data| {
            if data.transactions.iter().any(|t| t.id == transaction.id) {
                bail!("A transaction with id '{}' already exists", transaction.id);
            }
            data.transactions.push(transaction.clone());
            Ok(transaction)
        })
        .await
    }

    async fn update_transaction(&self, transaction: Transaction) -> Res<Transaction> {
        self.mutate(|data| {
            let existing = data
                .transactions
                .iter_mut()
                .find(|t| t.id == transaction.id)
                .with_context(|| format!("Transaction '{}' not found", transaction.id))?;
            *existing = transaction.clone();
            Ok(transaction)
        })
        .await
    }

    async fn delete_transaction(&self, id: &str) -> Res<()> {
        self.mutate(|data| {
            let before = data.transactions.len();
            data.transactions.retain(|t| t.id != id);
            if data.transactions.len() == before {
                bail!("Transaction '{id}' not found");
            }
            Ok(())
        })
        .await
    }

    fn transactions(&self) -> BoxedSequence<Vec<Transaction>> {
        let mut rx = self.transactions.subscribe();
        rx.mark_changed();
        Box::new(rx)
    }

    fn budgets(&self, as_of: NaiveDate) -> BoxedSequence<Vec<Budget>> {
        let mut rx = self.budgets.subscribe();
        rx.mark_changed();
        Box::new(Filtered::new(rx, move |budgets: Vec<Budget>| {
            budgets.into_iter().filter(|b| b.covers(as_of)).collect()
        }))
    }

    async fn categories(&self) -> Res<Vec<Category>> {
        Ok(self.state.lock().await.categories.data().clone())
    }

    async fn add_category(&self, category: Category) -> Res<Category> {
        self.mutate(|data| {
            data.categories.add(category.clone())?;
            Ok(category)
        })
        .await
    }

    async fn save_budget(&self, budget: Budget) -> Res<Budget> {
        ensure!(
            !budget.allocated().value().is_sign_negative(),
            "A budget allocation cannot be negative"
        );
        ensure!(
            budget.start_date() <= budget.end_date(),
            "A budget cannot end ({}) before it starts ({})",
            budget.end_date(),
            budget.start_date()
        );
        self.mutate(|data| {
            match data.budgets.iter_mut().find(|b| b.id == budget.id) {
                Some(existing) => *existing = budget.clone(),
                None => data.budgets.push(budget.clone()),
            }
            Ok(budget)
        })
        .await
    }

    async fn delete_budget(&self, id: &str) -> Res<()> {
        self.mutate(|data| {
            let before = data.budgets.len();
            data.budgets.retain(|b| b.id != id);
            if data.budgets.len() == before {
                bail!("Budget '{id}' not found");
            }
            Ok(())
        })
        .await
    }
}
