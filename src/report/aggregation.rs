//! Joins prorated budgets with grouped expenses for one calendar month.
//!
//! The monthly report, the dashboard and the budget-vs-actual chart all build
//! on [aggregate_month].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    budget::Budget,
    calendar::YearMonth,
    expense::CategorySpending,
    money::add_amounts,
    report::{proration::prorate, store::ReportStore},
};

/// Budget and spending for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    /// The spending category.
    pub category: String,
    /// The monthly limit prorated to the tracked part of the month, zero without a budget.
    pub prorated_budget: Decimal,
    /// The total spent in the month.
    pub spent: Decimal,
    /// How many expenses make up `spent`.
    pub transaction_count: u32,
}

/// Build one row per category that has a budget, spending in the month, or both.
///
/// Rows are sorted by `spent`, largest first, with ties broken by category name.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a budget or spending total is too large to work with.
pub fn aggregate_categories(
    budgets: &[Budget],
    spending: &[CategorySpending],
    tracking_start: Option<Date>,
    month: YearMonth,
) -> Result<Vec<CategoryAggregate>, Error> {
    let mut rows: BTreeMap<&str, CategoryAggregate> = BTreeMap::new();

    for budget in budgets {
        rows.insert(
            &budget.category,
            CategoryAggregate {
                category: budget.category.clone(),
                prorated_budget: prorate(budget.monthly_limit, tracking_start, month)?,
                spent: Decimal::ZERO,
                transaction_count: 0,
            },
        );
    }

    for group in spending {
        let row = rows
            .entry(&group.category)
            .or_insert_with(|| CategoryAggregate {
                category: group.category.clone(),
                prorated_budget: Decimal::ZERO,
                spent: Decimal::ZERO,
                transaction_count: 0,
            });
        row.spent = add_amounts(row.spent, group.total)?;
        row.transaction_count += group.count;
    }

    let mut rows: Vec<_> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.spent
            .cmp(&a.spent)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(rows)
}

/// Load the budgets, tracking start and spending for `month` and aggregate them.
pub fn aggregate_month(
    store: &impl ReportStore,
    user_id: UserID,
    month: YearMonth,
) -> Result<Vec<CategoryAggregate>, Error> {
    let range = month.date_range()?;
    let budgets = store.budgets(user_id)?;
    let tracking_start = store.tracking_start(user_id)?;
    let spending = store.sum_expenses_by_category(user_id, &range)?;

    aggregate_categories(&budgets, &spending, tracking_start, month)
}
