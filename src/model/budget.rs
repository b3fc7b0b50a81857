use crate::model::Amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An allocation of money to one category over an inclusive date window.
///
/// Only the allocation is stored. How much has been spent is derived on every aggregation pass, see
/// `BudgetUsage`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Budget {
    pub(crate) id: String,
    pub(crate) category: String,
    pub(crate) allocated: Amount,
    pub(crate) start_date: NaiveDate,
    pub(crate) end_date: NaiveDate,
}

impl Budget {
    pub fn new(
        category: impl Into<String>,
        allocated: Amount,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: format!("bud-{}", Uuid::new_v4().simple()),
            category: category.into(),
            allocated,
            start_date,
            end_date,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn allocated(&self) -> Amount {
        self.allocated
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// True when `date` is inside `[start_date, end_date]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// How close a budget is to its allocation.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Progress below 0.8.
    #[default]
    Safe,
    /// Progress in `[0.8, 1.0)`.
    Warning,
    /// Progress of 1.0 or more.
    Over,
}

serde_plain::derive_display_from_serialize!(BudgetStatus);
serde_plain::derive_fromstr_from_deserialize!(BudgetStatus);

/// Progress at which a budget turns `Warning`.
pub fn warning_threshold() -> Decimal {
    Decimal::new(8, 1)
}

/// Progress at which a budget turns `Over`.
pub fn over_threshold() -> Decimal {
    Decimal::ONE
}

impl BudgetStatus {
    pub fn from_progress(progress: Decimal) -> Self {
        if progress >= over_threshold() {
            BudgetStatus::Over
        } else if progress >= warning_threshold() {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Safe
        }
    }

    /// `Warning` and `Over` both deserve an alert.
    pub fn is_alerting(&self) -> bool {
        matches!(self, BudgetStatus::Warning | BudgetStatus::Over)
    }
}

/// A budget together with the values derived from the current transactions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetUsage {
    pub(crate) budget: Budget,
    pub(crate) spent: Decimal,
    pub(crate) progress: Decimal,
    pub(crate) status: BudgetStatus,
}

impl BudgetUsage {
    /// Derives progress and status from `spent`. An allocation of zero never divides: progress is
    /// zero and the budget is `Safe`. A ratio too large for a `Decimal` saturates at
    /// `Decimal::MAX`, which is `Over`.
    pub fn new(budget: Budget, spent: Decimal) -> Self {
        let allocated = budget.allocated.value();
        let progress = if allocated.is_zero() {
            Decimal::ZERO
        } else {
            spent.checked_div(allocated).unwrap_or(Decimal::MAX)
        };
        let status = if allocated.is_zero() {
            BudgetStatus::Safe
        } else {
            BudgetStatus::from_progress(progress)
        };
        Self {
            budget,
            spent,
            progress,
            status,
        }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn spent(&self) -> Decimal {
        self.spent
    }

    pub fn progress(&self) -> Decimal {
        self.progress
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    /// Progress as a whole percentage, truncated, e.g. `0.856` -> `85`. Saturates at `u32::MAX`.
    pub fn percent(&self) -> u32 {
        use rust_decimal::prelude::ToPrimitive;
        match self.progress.checked_mul(Decimal::ONE_HUNDRED) {
            Some(p) if p.is_sign_negative() => 0,
            Some(p) => p.trunc().to_u32().unwrap_or(u32::MAX),
            None => u32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(allocated: i64) -> Budget {
        Budget::new(
            "Food & Drinks",
            Amount::new(Decimal::from(allocated)),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        )
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(
            BudgetStatus::from_progress(Decimal::new(79, 2)),
            BudgetStatus::Safe
        );
        assert_eq!(
            BudgetStatus::from_progress(Decimal::new(8, 1)),
            BudgetStatus::Warning
        );
        assert_eq!(
            BudgetStatus::from_progress(Decimal::new(99, 2)),
            BudgetStatus::Warning
        );
        assert_eq!(BudgetStatus::from_progress(Decimal::ONE), BudgetStatus::Over);
        assert_eq!(
            BudgetStatus::from_progress(Decimal::new(15, 1)),
            BudgetStatus::Over
        );
    }

    #[test]
    fn test_zero_allocation_is_safe() {
        let usage = BudgetUsage::new(budget(0), Decimal::from(500));
        assert_eq!(usage.progress(), Decimal::ZERO);
        assert_eq!(usage.status(), BudgetStatus::Safe);
    }

    #[test]
    fn test_tiny_allocation_overspent_is_over() {
        let tiny = Budget::new(
            "Food & Drinks",
            Amount::new(Decimal::new(1, 28)),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
        );
        let usage = BudgetUsage::new(tiny, Decimal::from(1_000_000));
        assert_eq!(usage.progress(), Decimal::MAX);
        assert_eq!(usage.status(), BudgetStatus::Over);
        assert_eq!(usage.percent(), u32::MAX);
    }

    #[test]
    fn test_exact_warning_boundary() {
        let usage = BudgetUsage::new(budget(1_000_000), Decimal::from(800_000));
        assert_eq!(usage.status(), BudgetStatus::Warning);
        assert_eq!(usage.percent(), 80);
    }

    #[test]
    fn test_exact_over_boundary() {
        let usage = BudgetUsage::new(budget(1_000_000), Decimal::from(1_000_000));
        assert_eq!(usage.status(), BudgetStatus::Over);
        assert_eq!(usage.percent(), 100);
    }

    #[test]
    fn test_covers_is_inclusive() {
        let b = budget(1);
        assert!(b.covers(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
        assert!(b.covers(NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()));
        assert!(!b.covers(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()));
    }
}
