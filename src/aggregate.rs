//! One budget aggregation pass: joins a budget list with a transaction list and derives spent,
//! progress and status for every budget.

use crate::model::{Budget, BudgetUsage, Transaction};
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The result of one aggregation pass.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetSnapshot {
    /// Every budget, sorted by descending progress. Ties keep the input order.
    pub(crate) budgets: Vec<BudgetUsage>,
    /// Every budget in the order of the input list.
    pub(crate) listed: Vec<BudgetUsage>,
    /// The first three entries of `budgets`.
    pub(crate) top_three: Vec<BudgetUsage>,
    pub(crate) overall_allocated: Decimal,
    pub(crate) overall_spent: Decimal,
}

impl BudgetSnapshot {
    pub fn budgets(&self) -> &[BudgetUsage] {
        &self.budgets
    }

    /// The same budgets as `budgets`, in the order they were given to `aggregate`.
    pub fn listed(&self) -> &[BudgetUsage] {
        &self.listed
    }

    pub fn top_three(&self) -> &[BudgetUsage] {
        &self.top_three
    }

    pub fn overall_allocated(&self) -> Decimal {
        self.overall_allocated
    }

    pub fn overall_spent(&self) -> Decimal {
        self.overall_spent
    }
}

/// Sum of the expense transactions that count against `budget`: same category (exact), date
/// inside the inclusive window. The window is compared on the UTC calendar date. The sum saturates
/// at `Decimal::MAX`.
pub fn spent_for(budget: &Budget, transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.is_expense())
        .filter(|t| t.category() == budget.category())
        .filter(|t| budget.covers(t.date().date_naive()))
        .map(|t| t.amount().value())
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Runs one aggregation pass.
pub fn aggregate(budgets: &[Budget], transactions: &[Transaction]) -> BudgetSnapshot {
    let listed: Vec<BudgetUsage> = budgets
        .iter()
        .map(|b| BudgetUsage::new(b.clone(), spent_for(b, transactions)))
        .collect();

    // sort_by is stable
    let mut usages = listed.clone();
    usages.sort_by(|a, b| b.progress().cmp(&a.progress()));

    let overall_allocated = listed
        .iter()
        .map(|u| u.budget().allocated().value())
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let overall_spent = listed
        .iter()
        .map(|u| u.spent())
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let top_three = usages.iter().take(3).cloned().collect();

    BudgetSnapshot {
        budgets: usages,
        listed,
        top_three,
        overall_allocated,
        overall_spent,
    }
}

/// Forecasts the day the allocation runs out at the average daily spend so far.
///
/// Returns `None` when nothing has been spent, when the daily average is zero, or when the budget
/// is already exhausted. Elapsed days are floored at one.
pub fn projected(usage: &BudgetUsage, today: NaiveDate) -> Option<NaiveDate> {
    let spent = usage.spent();
    if spent <= Decimal::ZERO {
        return None;
    }
    let remaining = usage.budget().allocated().value() - spent;
    if remaining <= Decimal::ZERO {
        return None;
    }
    let elapsed = (today - usage.budget().start_date()).num_days().max(1);
    let daily = spent.checked_div(Decimal::from(elapsed))?;
    if daily.is_zero() {
        return None;
    }
    let days = remaining.checked_div(daily)?.floor().to_u64()?;
    today.checked_add_days(Days::new(days))
}
