use crate::aggregate::{aggregate, projected, BudgetSnapshot};
use crate::aggregator::BudgetAggregator;
use crate::alerts::{dispatch, AlertLedger, LogNotifier, Notifier};
use crate::args::{BudgetDeleteArgs, BudgetSetArgs, BudgetsArgs};
use crate::commands::{open_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::live::LiveSequence;
use crate::model::{Amount, Budget, BudgetStatus, BudgetUsage};
use crate::store::{FileStore, Store};
use crate::{Config, Result};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How often `--watch` re-reads the data file for changes made by other invocations.
const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// One budget as shown to the user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BudgetLine {
    pub id: String,
    pub category: String,
    pub allocated: Amount,
    pub spent: Amount,
    pub percent: u32,
    pub status: BudgetStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// The day the allocation runs out at the current pace, if there is any spending.
    pub projected: Option<NaiveDate>,
}

impl BudgetLine {
    fn new(usage: &BudgetUsage, as_of: NaiveDate) -> Self {
        let budget = usage.budget();
        Self {
            id: budget.id().to_string(),
            category: budget.category().to_string(),
            allocated: budget.allocated(),
            spent: Amount::new(usage.spent()),
            percent: usage.percent(),
            status: usage.status(),
            start_date: budget.start_date(),
            end_date: budget.end_date(),
            projected: projected(usage, as_of),
        }
    }
}

/// The budgets active on one day, most used first.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BudgetReport {
    as_of: NaiveDate,
    budgets: Vec<BudgetLine>,
    /// Ids of the three most used budgets.
    top_three: Vec<String>,
    overall_allocated: Amount,
    overall_spent: Amount,
    /// Ids of the budgets an alert was shown for. The final `--watch` report lists every alert of
    /// the session.
    alerted: Vec<String>,
}

impl BudgetReport {
    fn new(as_of: NaiveDate, snapshot: &BudgetSnapshot, alerted: Vec<String>) -> Self {
        Self {
            as_of,
            budgets: snapshot
                .budgets()
                .iter()
                .map(|u| BudgetLine::new(u, as_of))
                .collect(),
            top_three: snapshot
                .top_three()
                .iter()
                .map(|u| u.budget().id().to_string())
                .collect(),
            overall_allocated: Amount::new(snapshot.overall_allocated()),
            overall_spent: Amount::new(snapshot.overall_spent()),
            alerted,
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn budgets(&self) -> &[BudgetLine] {
        &self.budgets
    }

    pub fn top_three(&self) -> &[String] {
        &self.top_three
    }

    pub fn overall_allocated(&self) -> Amount {
        self.overall_allocated
    }

    pub fn overall_spent(&self) -> Amount {
        self.overall_spent
    }

    pub fn alerted(&self) -> &[String] {
        &self.alerted
    }

    fn message(&self) -> String {
        if self.budgets.is_empty() {
            return format!("No budgets are active on {}", self.as_of);
        }
        let mut s = format!("Budgets active on {}:", self.as_of);
        for line in &self.budgets {
            let _ = write!(
                s,
                "\n  {}: {} of {} ({}%, {})",
                line.category, line.spent, line.allocated, line.percent, line.status
            );
            if let Some(day) = line.projected {
                let _ = write!(s, ", runs out around {day}");
            }
        }
        let _ = write!(
            s,
            "\nOverall: {} of {}",
            self.overall_spent, self.overall_allocated
        );
        s
    }
}

/// Shows the budgets active on `--as-of` (default today) with their progress and dispatches alerts
/// for the ones at or above 80%. With `--watch` it keeps running until Ctrl-C and prints a new
/// report whenever the stored data changes.
pub async fn budgets(config: Config, args: BudgetsArgs) -> Result<Out<BudgetReport>> {
    let as_of = args.as_of().unwrap_or_else(|| Utc::now().date_naive());
    let store = open_store(&config).await?;
    let ledger = Arc::new(AlertLedger::new(config.notifications_enabled()));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    if !args.watch() {
        return Ok(report_once(store.as_ref(), as_of, &ledger, &notifier).await);
    }

    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    watch_until(store, as_of, ledger, notifier, RELOAD_INTERVAL, stop).await
}

/// Runs a single aggregation pass over the current data and dispatches alerts.
pub(super) async fn report_once(
    store: &dyn Store,
    as_of: NaiveDate,
    ledger: &AlertLedger,
    notifier: &Arc<dyn Notifier>,
) -> Out<BudgetReport> {
    let budgets = store.budgets(as_of).next().await.unwrap_or_default();
    let transactions = store.transactions().next().await.unwrap_or_default();
    let snapshot = aggregate(&budgets, &transactions);
    let alerted = dispatch(&snapshot, ledger, notifier);
    let report = BudgetReport::new(as_of, &snapshot, alerted);
    Out::new(report.message(), report)
}

async fn watch_until<F>(
    store: Arc<FileStore>,
    as_of: NaiveDate,
    ledger: Arc<AlertLedger>,
    notifier: Arc<dyn Notifier>,
    reload_every: Duration,
    stop: F,
) -> Result<Out<BudgetReport>>
where
    F: Future<Output = ()>,
{
    let mut aggregator =
        BudgetAggregator::spawn(store.budgets(as_of), store.transactions(), ledger, notifier);
    let mut reload = tokio::time::interval(reload_every);
    reload.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut alerted = Vec::new();
    tokio::pin!(stop);
    info!("Watching budgets active on {as_of}, press Ctrl-C to stop");

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            pass = aggregator.next_pass() => match pass {
                Some(pass) => {
                    alerted.extend_from_slice(pass.alerted());
                    let report = BudgetReport::new(as_of, pass.snapshot(), pass.alerted().to_vec());
                    Out::new(report.message(), report).print();
                }
                None => {
                    debug!("The budget aggregator stopped");
                    break;
                }
            },
            _ = reload.tick() => {
                if let Err(e) = store.reload().await {
                    warn!("{e:#}");
                }
            }
        }
    }

    Ok(match aggregator.latest() {
        Some(snapshot) => Out::new(
            "Stopped watching budgets",
            BudgetReport::new(as_of, &snapshot, alerted),
        ),
        None => Out::new_message("Stopped watching budgets"),
    })
}

/// Creates a budget or, with `--id`, replaces an existing one.
pub async fn budget_set(config: Config, args: BudgetSetArgs) -> Result<Out<Budget>> {
    let store = open_store(&config).await?;
    let mut budget = Budget::new(args.category(), args.amount(), args.start(), args.end());
    if let Some(id) = args.id() {
        budget = budget.with_id(id);
    }
    let saved = store
        .save_budget(budget)
        .await
        .context("Unable to save the budget")
        .pub_result(ErrorType::Store)?;
    Ok(Out::new(
        format!(
            "Saved budget {} for '{}': {} from {} to {}",
            saved.id(),
            saved.category(),
            saved.allocated(),
            saved.start_date(),
            saved.end_date()
        ),
        saved,
    ))
}

pub async fn budget_delete(config: Config, args: BudgetDeleteArgs) -> Result<Out<()>> {
    let store = open_store(&config).await?;
    store
        .delete_budget(args.id())
        .await
        .pub_result(ErrorType::Store)?;
    Ok(format!("Deleted budget {}", args.id()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::tests::RecordingNotifier;
    use crate::test::{this_month, TestEnv};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn amount(v: i64) -> Amount {
        Amount::new(Decimal::from(v))
    }

    #[tokio::test]
    async fn test_report_sorted_with_alerts() {
        let env = TestEnv::new().await;
        let (start, end) = this_month();
        let today = Utc::now();
        let food = env.add_budget("Food & Drinks", 1_000_000, start, end).await;
        let fun = env.add_budget("Entertainment", 1_000_000, start, end).await;
        env.add_expense("Food & Drinks", 850_000, today).await;
        env.add_expense("Entertainment", 100_000, today).await;

        let out = budgets(env.config(), BudgetsArgs::default()).await.unwrap();
        let report = out.structure().unwrap();
        let ids: Vec<&str> = report.budgets().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec![food.id(), fun.id()]);
        assert_eq!(report.budgets()[0].percent, 85);
        assert_eq!(report.budgets()[0].status, BudgetStatus::Warning);
        assert_eq!(report.alerted(), &[food.id().to_string()]);
        assert_eq!(report.overall_spent(), amount(950_000));
        assert!(out.message().contains("Food & Drinks: 850,000.00 of 1,000,000.00"));
    }

    #[tokio::test]
    async fn test_report_respects_notification_toggle() {
        let env = TestEnv::new().await;
        let (start, end) = this_month();
        env.add_budget("Food & Drinks", 100, start, end).await;
        env.add_expense("Food & Drinks", 150, Utc::now()).await;
        let mut config = env.config();
        config.set_notifications_enabled(false);

        let out = budgets(config, BudgetsArgs::default()).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.budgets()[0].status, BudgetStatus::Over);
        assert!(report.alerted().is_empty());
    }

    #[tokio::test]
    async fn test_as_of_selects_window() {
        let env = TestEnv::new().await;
        let sept = |d| NaiveDate::from_ymd_opt(2025, 9, d).unwrap();
        env.add_budget("Shopping", 500_000, sept(1), sept(30)).await;
        env.add_expense(
            "Shopping",
            100_000,
            Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap(),
        )
        .await;

        let args = BudgetsArgs::new(false, Some(sept(30)));
        let report = budgets(env.config(), args).await.unwrap();
        let report = report.structure().unwrap();
        assert_eq!(report.budgets().len(), 1);
        assert_eq!(report.budgets()[0].percent, 20);
        assert_eq!(report.as_of(), sept(30));

        let args = BudgetsArgs::new(false, Some(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
        let out = budgets(env.config(), args).await.unwrap();
        assert!(out.structure().unwrap().budgets().is_empty());
        assert_eq!(out.message(), "No budgets are active on 2025-10-01");
    }

    #[tokio::test]
    async fn test_watch_picks_up_changes_from_another_writer() {
        let env = TestEnv::new().await;
        let (start, end) = this_month();
        let budget = env.add_budget("Food & Drinks", 1_000_000, start, end).await;

        let store = Arc::new(env.store().await);
        let ledger = Arc::new(AlertLedger::new(true));
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = recorder.clone();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let stop = async move {
            let _ = stop_rx.await;
        };
        let watching = tokio::spawn(watch_until(
            store,
            Utc::now().date_naive(),
            ledger,
            notifier,
            Duration::from_millis(10),
            stop,
        ));

        env.add_expense("Food & Drinks", 900_000, Utc::now()).await;
        for _ in 0..200 {
            if !recorder.alerts().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(()).unwrap();

        let out = watching.await.unwrap().unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.budgets()[0].percent, 90);
        assert_eq!(report.alerted(), &[budget.id().to_string()]);
        assert_eq!(recorder.alerts().len(), 1);
        assert_eq!(recorder.alerts()[0].0, budget.id());
    }

    #[tokio::test]
    async fn test_budget_set_replace_and_delete() {
        let env = TestEnv::new().await;
        let (start, end) = this_month();
        let out = budget_set(
            env.config(),
            BudgetSetArgs::new("Rent", amount(3_000_000), start, end, None),
        )
        .await
        .unwrap();
        let id = out.structure().unwrap().id().to_string();

        budget_set(
            env.config(),
            BudgetSetArgs::new("Rent", amount(3_500_000), start, end, Some(id.clone())),
        )
        .await
        .unwrap();
        let stored = env.store().await.data().await.budgets;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].allocated(), amount(3_500_000));

        budget_delete(env.config(), BudgetDeleteArgs::new(&id))
            .await
            .unwrap();
        assert!(env.store().await.data().await.budgets.is_empty());

        let err = budget_delete(env.config(), BudgetDeleteArgs::new(&id))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Store);
    }

    #[tokio::test]
    async fn test_budget_set_rejects_reversed_window() {
        let env = TestEnv::new().await;
        let (start, end) = this_month();
        let err = budget_set(
            env.config(),
            BudgetSetArgs::new("Rent", amount(1), end, start, None),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }
}
