//! The current-month budget dashboard.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::YearMonth,
    money::{percentage_of, round_percentage, sum_amounts},
    report::{
        aggregation::{CategoryAggregate, aggregate_month},
        learning_period::learning_period_status,
        store::ReportStore,
    },
};

const WARNING_PERCENTAGE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// How a category's spending this month compares with its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    /// Less than 80% of the budget is spent.
    Safe,
    /// Between 80% and 100% of the budget is spent.
    Warning,
    /// The whole budget is spent.
    Exceeded,
    /// There is no budget for the category this month.
    NoBudget,
}

/// One category on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    /// The spending category.
    pub category: String,
    /// The prorated budget for the current month.
    pub budget: Decimal,
    /// The total spent so far this month.
    pub spent: Decimal,
    /// What is left of the budget, never negative.
    pub remaining: Decimal,
    /// Spent as a percentage of the budget, to one decimal place.
    pub percentage: Decimal,
    /// How spending compares with the budget.
    pub status: DashboardStatus,
}

impl TryFrom<CategoryAggregate> for DashboardRow {
    type Error = Error;

    fn try_from(aggregate: CategoryAggregate) -> Result<Self, Error> {
        let percentage = percentage_of(aggregate.spent, aggregate.prorated_budget)?;

        let status = if aggregate.prorated_budget.is_zero() {
            DashboardStatus::NoBudget
        } else if percentage >= Decimal::ONE_HUNDRED {
            DashboardStatus::Exceeded
        } else if percentage >= WARNING_PERCENTAGE {
            DashboardStatus::Warning
        } else {
            DashboardStatus::Safe
        };

        Ok(Self {
            remaining: (aggregate.prorated_budget - aggregate.spent).max(Decimal::ZERO),
            percentage: round_percentage(percentage),
            status,
            category: aggregate.category,
            budget: aggregate.prorated_budget,
            spent: aggregate.spent,
        })
    }
}

/// Spending against budgets for the current month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// One row per budgeted or spent-in category, largest spending first.
    pub categories: Vec<DashboardRow>,
    /// The sum of the prorated budgets.
    pub total_budget: Decimal,
    /// The sum of spending this month.
    pub total_spent: Decimal,
    /// What is left of the total budget, never negative.
    pub total_remaining: Decimal,
    /// Whether the user is still in their learning period.
    pub is_learning_period: bool,
}

/// Build the dashboard for the month containing `today`.
pub fn build_dashboard(
    store: &impl ReportStore,
    user_id: UserID,
    today: Date,
    learning_period_days: u16,
) -> Result<Dashboard, Error> {
    let categories: Vec<DashboardRow> = aggregate_month(store, user_id, YearMonth::of(today))?
        .into_iter()
        .map(DashboardRow::try_from)
        .collect::<Result<_, _>>()?;

    let total_budget = sum_amounts(categories.iter().map(|row| row.budget))?;
    let total_spent = sum_amounts(categories.iter().map(|row| row.spent))?;
    let learning_period = learning_period_status(store, user_id, today, learning_period_days)?;

    Ok(Dashboard {
        categories,
        total_budget,
        total_spent,
        total_remaining: (total_budget - total_spent).max(Decimal::ZERO),
        is_learning_period: !learning_period.is_complete,
    })
}
