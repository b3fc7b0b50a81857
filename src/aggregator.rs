//! The reactive budget aggregator: a background task that joins the live budget sequence with the
//! live transaction sequence (combine-latest), recomputes a `BudgetSnapshot` on every upstream
//! change, dispatches alerts and publishes the snapshot together with the alerted ids.

use crate::aggregate::{aggregate, BudgetSnapshot};
use crate::alerts::{dispatch, AlertLedger, Notifier};
use crate::live::BoxedSequence;
use crate::model::{Budget, Transaction};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// What one aggregation pass published.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AggregationPass {
    snapshot: BudgetSnapshot,
    alerted: Vec<String>,
}

impl AggregationPass {
    pub fn snapshot(&self) -> &BudgetSnapshot {
        &self.snapshot
    }

    /// Ids of the budgets alerted during this pass, in budget list order.
    pub fn alerted(&self) -> &[String] {
        &self.alerted
    }
}

/// Handle to a running aggregator. Dropping it stops the background task.
pub struct BudgetAggregator {
    passes: watch::Receiver<Option<AggregationPass>>,
    task: JoinHandle<()>,
}

impl BudgetAggregator {
    /// Starts the aggregator. Nothing is published until both sequences have produced at least one
    /// value. When one sequence ends its last value keeps being used; the task finishes once both
    /// have ended.
    pub fn spawn(
        budgets: BoxedSequence<Vec<Budget>>,
        transactions: BoxedSequence<Vec<Transaction>>,
        ledger: Arc<AlertLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(budgets, transactions, ledger, notifier, tx));
        Self { passes: rx, task }
    }

    /// The most recent snapshot, if one has been computed.
    pub fn latest(&self) -> Option<BudgetSnapshot> {
        self.passes.borrow().as_ref().map(|p| p.snapshot.clone())
    }

    /// Waits for the next pass published after the last one returned by this method. Returns
    /// `None` when the aggregator has stopped.
    pub async fn next_pass(&mut self) -> Option<AggregationPass> {
        loop {
            self.passes.changed().await.ok()?;
            if let Some(pass) = self.passes.borrow_and_update().clone() {
                return Some(pass);
            }
        }
    }
}

impl Drop for BudgetAggregator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut budgets: BoxedSequence<Vec<Budget>>,
    mut transactions: BoxedSequence<Vec<Transaction>>,
    ledger: Arc<AlertLedger>,
    notifier: Arc<dyn Notifier>,
    out: watch::Sender<Option<AggregationPass>>,
) {
    let mut latest_budgets: Option<Vec<Budget>> = None;
    let mut latest_transactions: Option<Vec<Transaction>> = None;
    let mut budgets_open = true;
    let mut transactions_open = true;
    let mut pass: u64 = 0;

    while budgets_open || transactions_open {
        tokio::select! {
            next = budgets.next(), if budgets_open => match next {
                Some(value) => {
                    trace!("Received {} budgets", value.len());
                    latest_budgets = Some(value);
                }
                None => {
                    debug!("Budget sequence ended");
                    budgets_open = false;
                    continue;
                }
            },
            next = transactions.next(), if transactions_open => match next {
                Some(value) => {
                    trace!("Received {} transactions", value.len());
                    latest_transactions = Some(value);
                }
                None => {
                    debug!("Transaction sequence ended");
                    transactions_open = false;
                    continue;
                }
            },
        }

        let (Some(b), Some(t)) = (&latest_budgets, &latest_transactions) else {
            continue;
        };
        pass += 1;
        let snapshot = aggregate(b, t);
        debug!(
            "Aggregation pass {pass}: {} budgets over {} transactions",
            snapshot.budgets().len(),
            t.len()
        );
        let alerted = dispatch(&snapshot, &ledger, &notifier);
        out.send_replace(Some(AggregationPass { snapshot, alerted }));
    }
    debug!("Budget aggregator stopped after {pass} passes");
}
