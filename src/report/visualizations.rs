//! Data series for the charts: monthly trends, category breakdown and budget vs actual.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::YearMonth,
    report::{aggregation::aggregate_month, store::ReportStore},
};

/// How many months of history the trend chart shows.
pub const TREND_MONTHS: u32 = 12;

/// Total spending in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The month.
    pub month: YearMonth,
    /// The total spent in the month.
    pub total: Decimal,
}

/// Total spending in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The spending category.
    pub category: String,
    /// The total spent in the category.
    pub total: Decimal,
}

/// A category's budget and actual spending this month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparison {
    /// The spending category.
    pub category: String,
    /// The prorated budget.
    pub budget: Decimal,
    /// The amount actually spent.
    pub actual: Decimal,
}

/// The same day `months` months before `date`, clamped to the end of shorter months.
fn same_day_months_before(date: Date, months: u32) -> Result<Date, Error> {
    let month = YearMonth::of(date).months_before(months)?;
    let day = date.day().min(month.days_in_month());

    Date::from_calendar_date(month.year(), month.month(), day)
        .map_err(|error| Error::InvalidArgument(error.to_string()))
}

/// Spending per month over the last year, oldest first.
pub fn monthly_trends(
    store: &impl ReportStore,
    user_id: UserID,
    today: Date,
) -> Result<Vec<MonthlyTotal>, Error> {
    let since = same_day_months_before(today, TREND_MONTHS)?;

    Ok(store
        .sum_expenses_by_month(user_id, since)?
        .into_iter()
        .map(|(month, total)| MonthlyTotal { month, total })
        .collect())
}

/// Spending per category between two optional, inclusive dates, largest first.
pub fn category_breakdown(
    store: &impl ReportStore,
    user_id: UserID,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<Vec<CategoryTotal>, Error> {
    let mut totals: Vec<CategoryTotal> = store
        .sum_expenses_by_category_between(user_id, start, end)?
        .into_iter()
        .map(|group| CategoryTotal {
            category: group.category,
            total: group.total,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(totals)
}

/// Prorated budgets against spending for the month containing `today`.
pub fn budget_vs_actual(
    store: &impl ReportStore,
    user_id: UserID,
    today: Date,
) -> Result<Vec<BudgetComparison>, Error> {
    Ok(aggregate_month(store, user_id, YearMonth::of(today))?
        .into_iter()
        .map(|aggregate| BudgetComparison {
            category: aggregate.category,
            budget: aggregate.prorated_budget,
            actual: aggregate.spent,
        })
        .collect())
}
