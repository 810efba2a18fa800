//! The learning period: a fixed window of days, starting the first time a user
//! asks about it, whose spending is used to suggest budgets.
//!
//! Unlike the calendar-month reports, the window is not aligned to months and
//! nothing is prorated.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::{DateRange, iso_date},
    expense::CategorySpending,
    money::{format_money, format_percentage, percentage_of, round_money, sum_amounts},
    report::store::ReportStore,
};

/// The default length of the learning period in days.
pub const DEFAULT_LEARNING_PERIOD_DAYS: u16 = 30;

/// How far through the learning period the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningPeriodStatus {
    /// The first day of the learning period.
    #[serde(with = "iso_date")]
    pub start_date: Date,
    /// Whole days since the start, between zero and the period length.
    pub days_elapsed: u16,
    /// Days left in the period.
    pub days_remaining: u16,
    /// Whether the whole period has elapsed.
    pub is_complete: bool,
}

/// Get the learning period status as of `today`, starting the period today if needed.
pub fn learning_period_status(
    store: &impl ReportStore,
    user_id: UserID,
    today: Date,
    period_days: u16,
) -> Result<LearningPeriodStatus, Error> {
    let start_date = store.learning_start_date(user_id, today)?;
    let elapsed = (today - start_date).whole_days();

    let days_elapsed = elapsed.clamp(0, i64::from(period_days)) as u16;

    Ok(LearningPeriodStatus {
        start_date,
        days_elapsed,
        days_remaining: period_days - days_elapsed,
        is_complete: elapsed >= i64::from(period_days),
    })
}

/// Spending during the learning period and the budgets it suggests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningPeriodAnalysis {
    /// The total spent during the period, rounded to cents.
    pub total_spending: Decimal,
    /// The total spent per category.
    pub category_totals: BTreeMap<String, Decimal>,
    /// A suggested monthly budget per category.
    pub suggested_budgets: BTreeMap<String, Decimal>,
    /// Human readable observations about the spending.
    pub insights: Vec<String>,
}

/// Analyse the spending in the learning period.
///
/// The period covers `period_days` days from the learning start date, whether
/// or not they have all elapsed yet.
pub fn analyse_learning_period(
    store: &impl ReportStore,
    user_id: UserID,
    today: Date,
    period_days: u16,
) -> Result<LearningPeriodAnalysis, Error> {
    let start_date = store.learning_start_date(user_id, today)?;
    let window = DateRange::starting_at(start_date, period_days)?;
    let spending = store.sum_expenses_by_category(user_id, &window)?;

    let total_spending = sum_amounts(spending.iter().map(|group| group.total))?;

    let category_totals = spending
        .iter()
        .map(|group| (group.category.clone(), group.total))
        .collect();
    let suggested_budgets = spending
        .iter()
        .map(|group| (group.category.clone(), round_money(group.total)))
        .collect();

    Ok(LearningPeriodAnalysis {
        total_spending: round_money(total_spending),
        category_totals,
        suggested_budgets,
        insights: generate_insights(&spending, total_spending, period_days)?,
    })
}

fn generate_insights(
    spending: &[CategorySpending],
    total_spending: Decimal,
    period_days: u16,
) -> Result<Vec<String>, Error> {
    // Ties go to the first category by name.
    let top = spending.iter().fold(None, |top: Option<&CategorySpending>, group| match top {
        Some(top) if top.total >= group.total => Some(top),
        _ => Some(group),
    });

    let Some(top) = top else {
        return Ok(vec!["No spending data available yet.".to_owned()]);
    };

    let share = percentage_of(top.total, total_spending)?;
    let daily_average = total_spending
        .checked_div(Decimal::from(period_days))
        .ok_or_else(|| {
            Error::InvalidArgument("the learning period must be at least one day".to_owned())
        })?;

    Ok(vec![
        format!(
            "Your highest spending category is {} (${}, {}% of total)",
            top.category,
            format_money(top.total),
            format_percentage(share)
        ),
        format!(
            "Your average daily spending is ${}",
            format_money(daily_average)
        ),
        format!("Your monthly spending is ${}", format_money(total_spending)),
    ])
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        UserID,
        report::{
            analyse_learning_period, learning_period_status, store::stub::StubReportStore,
        },
    };

    const USER: UserID = UserID::new(1);

    fn store_started_on(start: time::Date) -> StubReportStore {
        StubReportStore {
            learning_start: Cell::new(Some(start)),
            ..Default::default()
        }
    }

    #[test]
    fn first_access_starts_period_today() {
        let store = StubReportStore::default();

        let status = learning_period_status(&store, USER, date!(2024 - 03 - 10), 30).unwrap();

        assert_eq!(status.start_date, date!(2024 - 03 - 10));
        assert_eq!(status.days_elapsed, 0);
        assert_eq!(status.days_remaining, 30);
        assert!(!status.is_complete);
        assert_eq!(store.learning_start.get(), Some(date!(2024 - 03 - 10)));
    }

    #[test]
    fn counts_elapsed_days() {
        let store = store_started_on(date!(2024 - 03 - 01));

        let status = learning_period_status(&store, USER, date!(2024 - 03 - 13), 30).unwrap();

        assert_eq!(status.days_elapsed, 12);
        assert_eq!(status.days_remaining, 18);
        assert!(!status.is_complete);
    }

    #[test]
    fn completes_after_period_days() {
        let store = store_started_on(date!(2024 - 03 - 01));

        let last_day = learning_period_status(&store, USER, date!(2024 - 03 - 30), 30).unwrap();
        let complete = learning_period_status(&store, USER, date!(2024 - 03 - 31), 30).unwrap();
        let long_after = learning_period_status(&store, USER, date!(2025 - 01 - 01), 30).unwrap();

        assert!(!last_day.is_complete);
        assert!(complete.is_complete);
        assert_eq!(complete.days_remaining, 0);
        assert_eq!(long_after.days_elapsed, 30);
        assert_eq!(long_after.days_remaining, 0);
    }

    #[test]
    fn start_after_today_counts_as_zero_days() {
        let store = store_started_on(date!(2024 - 03 - 20));

        let status = learning_period_status(&store, USER, date!(2024 - 03 - 10), 14).unwrap();

        assert_eq!(status.days_elapsed, 0);
        assert_eq!(status.days_remaining, 14);
    }

    #[test]
    fn analysis_without_spending() {
        let store = StubReportStore::default();

        let analysis = analyse_learning_period(&store, USER, date!(2024 - 03 - 10), 30).unwrap();

        assert_eq!(analysis.total_spending, dec!(0));
        assert!(analysis.category_totals.is_empty());
        assert!(analysis.suggested_budgets.is_empty());
        assert_eq!(analysis.insights, ["No spending data available yet."]);
    }

    #[test]
    fn analysis_covers_window_only() {
        let store = StubReportStore {
            expenses: vec![
                (date!(2024 - 02 - 29), "Groceries", dec!(1000)),
                (date!(2024 - 03 - 01), "Groceries", dec!(120.505)),
                (date!(2024 - 03 - 15), "Transport", dec!(60)),
                (date!(2024 - 03 - 30), "Groceries", dec!(30)),
                (date!(2024 - 03 - 31), "Groceries", dec!(1000)),
            ],
            ..store_started_on(date!(2024 - 03 - 01))
        };

        let analysis = analyse_learning_period(&store, USER, date!(2024 - 04 - 15), 30).unwrap();

        assert_eq!(analysis.total_spending, dec!(210.51));
        assert_eq!(analysis.category_totals["Groceries"], dec!(150.505));
        assert_eq!(analysis.suggested_budgets["Groceries"], dec!(150.51));
        assert_eq!(analysis.suggested_budgets["Transport"], dec!(60));
        assert_eq!(
            analysis.insights,
            [
                "Your highest spending category is Groceries ($150.51, 71.5% of total)",
                "Your average daily spending is $7.02",
                "Your monthly spending is $210.51",
            ]
        );
    }

    #[test]
    fn top_category_ties_go_to_first_name() {
        let store = StubReportStore {
            expenses: vec![
                (date!(2024 - 03 - 02), "Transport", dec!(50)),
                (date!(2024 - 03 - 03), "Books", dec!(50)),
            ],
            ..store_started_on(date!(2024 - 03 - 01))
        };

        let analysis = analyse_learning_period(&store, USER, date!(2024 - 03 - 05), 10).unwrap();

        assert_eq!(
            analysis.insights[0],
            "Your highest spending category is Books ($50.00, 50.0% of total)"
        );
        assert_eq!(analysis.insights[1], "Your average daily spending is $10.00");
    }
}
