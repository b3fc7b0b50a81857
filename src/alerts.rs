//! Budget threshold alerts: the one-shot dedup ledger, the notification toggle, and the notifier
//! that actually shows an alert.

use crate::aggregate::BudgetSnapshot;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Shows a budget alert to the user. Fire-and-forget: nothing is returned and failures are the
/// notifier's own business.
pub trait Notifier: Send + Sync {
    fn show_budget_alert(&self, budget_id: &str, category: &str, percent: u32);
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_budget_alert(&self, budget_id: &str, category: &str, percent: u32) {
        info!("Budget alert: '{category}' has used {percent}% of its allocation ({budget_id})");
    }
}

/// Remembers which budgets have already been alerted for the lifetime of this value, and holds the
/// global notification toggle. Create one per session and share it through an `Arc`.
#[derive(Debug)]
pub struct AlertLedger {
    alerted: Mutex<HashSet<String>>,
    enabled: AtomicBool,
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AlertLedger {
    pub fn new(enabled: bool) -> Self {
        Self {
            alerted: Mutex::new(HashSet::new()),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// True when alerts are enabled and `budget_id` has not been alerted yet. Does not record
    /// anything.
    pub fn should_alert(&self, budget_id: &str) -> bool {
        self.is_enabled() && !self.lock().contains(budget_id)
    }

    pub fn mark_alerted(&self, budget_id: &str) {
        self.lock().insert(budget_id.to_string());
    }

    /// `should_alert` and `mark_alerted` under one lock, so two passes racing on the same budget
    /// cannot both win. Returns false, without recording, while alerts are disabled.
    pub fn try_claim(&self, budget_id: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.lock().insert(budget_id.to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked: every operation is a single insert or
        // lookup.
        self.alerted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Alerts every budget in `snapshot` that is in `Warning` or `Over` and has not been alerted yet,
/// in the order of the budget list, not the progress order. Returns the ids that were alerted.
pub fn dispatch(
    snapshot: &BudgetSnapshot,
    ledger: &AlertLedger,
    notifier: &Arc<dyn Notifier>,
) -> Vec<String> {
    if !ledger.is_enabled() {
        debug!("Notifications are disabled, skipping alert dispatch");
        return Vec::new();
    }
    let mut alerted = Vec::new();
    for usage in snapshot.listed() {
        if !usage.status().is_alerting() {
            continue;
        }
        let budget = usage.budget();
        if !ledger.try_claim(budget.id()) {
            continue;
        }
        info!(
            "Dispatching {} alert for budget {} ({})",
            usage.status(),
            budget.id(),
            budget.category()
        );
        notifier.show_budget_alert(budget.id(), budget.category(), usage.percent());
        alerted.push(budget.id().to_string());
    }
    alerted
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::model::{Amount, Budget, Transaction, TransactionKind};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    /// Records every alert it is asked to show.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        alerts: Mutex<Vec<(String, String, u32)>>,
    }

    impl RecordingNotifier {
        pub(crate) fn alerts(&self) -> Vec<(String, String, u32)> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn show_budget_alert(&self, budget_id: &str, category: &str, percent: u32) {
            self.alerts.lock().unwrap().push((
                budget_id.to_string(),
                category.to_string(),
                percent,
            ));
        }
    }

    fn snapshot(spent: i64) -> BudgetSnapshot {
        let budget = Budget::new(
            "Food & Drinks",
            Amount::new(Decimal::from(1_000_000)),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        )
        .with_id("bud-food");
        let t = Transaction::new(
            Amount::new(Decimal::from(spent)),
            TransactionKind::Expense,
            "Food & Drinks",
            "",
            Utc.with_ymd_and_hms(2025, 10, 3, 0, 0, 0).unwrap(),
        );
        aggregate(&[budget], &[t])
    }

    #[test]
    fn test_should_alert_once() {
        let ledger = AlertLedger::default();
        assert!(ledger.should_alert("b1"));
        ledger.mark_alerted("b1");
        assert!(!ledger.should_alert("b1"));
        assert!(ledger.should_alert("b2"));
    }

    #[test]
    fn test_disabled_does_not_consume() {
        let ledger = AlertLedger::new(false);
        assert!(!ledger.should_alert("b1"));
        assert!(!ledger.try_claim("b1"));
        ledger.set_enabled(true);
        assert!(ledger.should_alert("b1"));
    }

    #[test]
    fn test_dispatch_fires_once_across_passes() {
        let ledger = AlertLedger::default();
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = recorder.clone();

        let first = dispatch(&snapshot(850_000), &ledger, &notifier);
        assert_eq!(first, vec!["bud-food".to_string()]);
        let second = dispatch(&snapshot(850_000), &ledger, &notifier);
        assert!(second.is_empty());
        // Escalating to Over does not fire again either.
        let third = dispatch(&snapshot(1_200_000), &ledger, &notifier);
        assert!(third.is_empty());

        assert_eq!(
            recorder.alerts(),
            vec![("bud-food".to_string(), "Food & Drinks".to_string(), 85)]
        );
    }

    #[test]
    fn test_dispatch_replays_after_reenable() {
        let ledger = AlertLedger::new(false);
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = recorder.clone();

        assert!(dispatch(&snapshot(900_000), &ledger, &notifier).is_empty());
        ledger.set_enabled(true);
        assert_eq!(dispatch(&snapshot(900_000), &ledger, &notifier).len(), 1);
        assert_eq!(recorder.alerts()[0].2, 90);
    }

    #[test]
    fn test_dispatch_follows_budget_list_order() {
        let window = |id: &str, category: &str| {
            Budget::new(
                category,
                Amount::new(Decimal::from(100)),
                NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            )
            .with_id(id)
        };
        let expense = |category: &str, amount: i64| {
            Transaction::new(
                Amount::new(Decimal::from(amount)),
                TransactionKind::Expense,
                category,
                "",
                Utc.with_ymd_and_hms(2025, 10, 3, 0, 0, 0).unwrap(),
            )
        };
        let budgets = vec![window("first", "Food"), window("second", "Rent")];
        let snapshot = aggregate(&budgets, &[expense("Food", 85), expense("Rent", 120)]);
        assert_eq!(snapshot.budgets()[0].budget().id(), "second");

        let ledger = AlertLedger::default();
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = recorder.clone();
        let alerted = dispatch(&snapshot, &ledger, &notifier);
        assert_eq!(alerted, vec!["first".to_string(), "second".to_string()]);
        let shown: Vec<String> = recorder.alerts().into_iter().map(|a| a.0).collect();
        assert_eq!(shown, alerted);
    }

    #[test]
    fn test_safe_budget_not_alerted() {
        let ledger = AlertLedger::default();
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        assert!(dispatch(&snapshot(100_000), &ledger, &notifier).is_empty());
        assert!(ledger.should_alert("bud-food"));
    }
}
