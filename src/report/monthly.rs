//! The report comparing spending against prorated budgets for any calendar month.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    calendar::YearMonth,
    money::{percentage_of, round_percentage, sum_amounts},
    report::{
        aggregation::{CategoryAggregate, aggregate_month},
        store::ReportStore,
    },
};

/// Spending at or above this share of the budget earns a warning.
const WARNING_PERCENTAGE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// How a category's spending compares with its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    /// There is no budget for the category this month.
    NoBudget,
    /// More was spent than budgeted.
    Over,
    /// At least 80% of the budget is spent.
    Warning,
    /// Less than 80% of the budget is spent.
    Under,
}

impl CategoryStatus {
    fn classify(prorated_budget: Decimal, spent: Decimal, percentage: Decimal) -> Self {
        if prorated_budget.is_zero() {
            CategoryStatus::NoBudget
        } else if spent > prorated_budget {
            CategoryStatus::Over
        } else if percentage >= WARNING_PERCENTAGE {
            CategoryStatus::Warning
        } else {
            CategoryStatus::Under
        }
    }
}

/// One category in a [MonthlyReport].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReportRow {
    /// The spending category.
    pub category: String,
    /// The budget for the month after proration.
    #[serde(rename = "budget")]
    pub prorated_budget: Decimal,
    /// The total spent in the month.
    pub spent: Decimal,
    /// `prorated_budget - spent`, negative when over budget.
    pub difference: Decimal,
    /// Spent as a percentage of the budget, to one decimal place.
    pub percentage: Decimal,
    /// How many expenses make up `spent`.
    pub transaction_count: u32,
    /// How spending compares with the budget.
    pub status: CategoryStatus,
}

impl TryFrom<CategoryAggregate> for CategoryReportRow {
    type Error = Error;

    fn try_from(aggregate: CategoryAggregate) -> Result<Self, Error> {
        let percentage = percentage_of(aggregate.spent, aggregate.prorated_budget)?;

        Ok(Self {
            status: CategoryStatus::classify(aggregate.prorated_budget, aggregate.spent, percentage),
            difference: aggregate.prorated_budget - aggregate.spent,
            percentage: round_percentage(percentage),
            category: aggregate.category,
            prorated_budget: aggregate.prorated_budget,
            spent: aggregate.spent,
            transaction_count: aggregate.transaction_count,
        })
    }
}

/// Budgets, spending and savings for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    /// The month the report covers.
    pub month: YearMonth,
    /// One row per budgeted or spent-in category, largest spending first.
    pub categories: Vec<CategoryReportRow>,
    /// The sum of the prorated budgets.
    pub total_budget: Decimal,
    /// The sum of spending across all categories.
    pub total_spent: Decimal,
    /// The sum of savings in the month.
    pub total_saved: Decimal,
    /// `total_budget - total_spent`.
    pub total_difference: Decimal,
}

/// Build the report for `month`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the stored amounts are too large to total.
pub fn build_monthly_report(
    store: &impl ReportStore,
    user_id: UserID,
    month: YearMonth,
) -> Result<MonthlyReport, Error> {
    let categories: Vec<CategoryReportRow> = aggregate_month(store, user_id, month)?
        .into_iter()
        .map(CategoryReportRow::try_from)
        .collect::<Result<_, _>>()?;
    let total_saved = store.sum_savings(user_id, &month.date_range()?)?;

    let total_budget = sum_amounts(categories.iter().map(|row| row.prorated_budget))?;
    let total_spent = sum_amounts(categories.iter().map(|row| row.spent))?;

    Ok(MonthlyReport {
        month,
        categories,
        total_budget,
        total_spent,
        total_saved,
        total_difference: total_budget - total_spent,
    })
}

/// Parse a `YYYY-MM` token and build its report.
///
/// # Errors
/// Returns [Error::InvalidArgument] for a malformed token without touching the store.
pub fn build_monthly_report_for_token(
    store: &impl ReportStore,
    user_id: UserID,
    token: &str,
) -> Result<MonthlyReport, Error> {
    let month: YearMonth = token.parse()?;

    build_monthly_report(store, user_id, month)
}

/// The months in which the user spent anything, oldest first.
pub fn available_months(store: &impl ReportStore, user_id: UserID) -> Result<Vec<YearMonth>, Error> {
    store.expense_months(user_id)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, UserID,
        budget::Budget,
        calendar::YearMonth,
        report::{
            CategoryStatus, build_monthly_report, build_monthly_report_for_token,
            monthly::CategoryReportRow, store::stub::StubReportStore,
        },
    };

    const USER: UserID = UserID::new(1);

    fn february() -> YearMonth {
        YearMonth::new(2024, 2).unwrap()
    }

    fn row<'a>(rows: &'a [CategoryReportRow], category: &str) -> &'a CategoryReportRow {
        rows.iter()
            .find(|row| row.category == category)
            .expect("category should be in report")
    }

    #[test]
    fn empty_month_has_no_rows_and_zero_totals() {
        let store = StubReportStore::default();

        let report = build_monthly_report(&store, USER, february()).unwrap();

        assert!(report.categories.is_empty());
        assert_eq!(report.total_budget, Decimal::ZERO);
        assert_eq!(report.total_spent, Decimal::ZERO);
        assert_eq!(report.total_saved, Decimal::ZERO);
        assert_eq!(report.total_difference, Decimal::ZERO);
    }

    #[test]
    fn prorates_budgets_from_tracking_start() {
        let store = StubReportStore {
            budgets: vec![Budget::new("Groceries", dec!(300)).unwrap()],
            tracking_start: Some(date!(2024 - 02 - 15)),
            expenses: vec![(date!(2024 - 02 - 20), "Groceries", dec!(55.17))],
            ..Default::default()
        };

        let report = build_monthly_report(&store, USER, february()).unwrap();

        let groceries = row(&report.categories, "Groceries");
        assert_eq!(groceries.prorated_budget, dec!(155.17));
        assert_eq!(groceries.difference, dec!(100.00));
        assert_eq!(groceries.percentage, dec!(35.6));
        assert_eq!(groceries.status, CategoryStatus::Under);
    }

    #[test]
    fn statuses_follow_thresholds() {
        let store = StubReportStore {
            budgets: vec![
                Budget::new("Exact", dec!(100)).unwrap(),
                Budget::new("Over", dec!(100)).unwrap(),
                Budget::new("Warning", dec!(100)).unwrap(),
                Budget::new("Under", dec!(100)).unwrap(),
            ],
            expenses: vec![
                (date!(2024 - 02 - 01), "Exact", dec!(100)),
                (date!(2024 - 02 - 02), "Over", dec!(100.01)),
                (date!(2024 - 02 - 03), "Warning", dec!(80)),
                (date!(2024 - 02 - 04), "Under", dec!(79.99)),
                (date!(2024 - 02 - 05), "Unbudgeted", dec!(12)),
            ],
            ..Default::default()
        };

        let report = build_monthly_report(&store, USER, february()).unwrap();
        let rows = &report.categories;

        assert_eq!(row(rows, "Exact").status, CategoryStatus::Warning);
        assert_eq!(row(rows, "Over").status, CategoryStatus::Over);
        assert_eq!(row(rows, "Warning").status, CategoryStatus::Warning);
        assert_eq!(row(rows, "Under").status, CategoryStatus::Under);
        assert_eq!(row(rows, "Unbudgeted").status, CategoryStatus::NoBudget);
        assert_eq!(row(rows, "Unbudgeted").prorated_budget, dec!(0));
        assert_eq!(row(rows, "Unbudgeted").percentage, dec!(0));
    }

    #[test]
    fn budget_without_expenses_has_zero_spent() {
        let store = StubReportStore {
            budgets: vec![Budget::new("Utilities", dec!(150)).unwrap()],
            ..Default::default()
        };

        let report = build_monthly_report(&store, USER, february()).unwrap();

        let utilities = row(&report.categories, "Utilities");
        assert_eq!(utilities.spent, dec!(0));
        assert_eq!(utilities.transaction_count, 0);
        assert_eq!(utilities.difference, dec!(150));
    }

    #[test]
    fn totals_add_up() {
        let store = StubReportStore {
            budgets: vec![
                Budget::new("Groceries", dec!(300)).unwrap(),
                Budget::new("Dining Out", dec!(100)).unwrap(),
            ],
            tracking_start: Some(date!(2024 - 02 - 15)),
            expenses: vec![
                (date!(2024 - 02 - 16), "Groceries", dec!(40.10)),
                (date!(2024 - 02 - 17), "Groceries", dec!(9.95)),
                (date!(2024 - 02 - 18), "Dining Out", dec!(75.5)),
                (date!(2024 - 02 - 19), "Shopping", dec!(20)),
                (date!(2024 - 03 - 01), "Groceries", dec!(500)),
            ],
            savings: vec![
                (date!(2024 - 02 - 29), dec!(50)),
                (date!(2024 - 01 - 31), dec!(999)),
            ],
            ..Default::default()
        };

        let report = build_monthly_report(&store, USER, february()).unwrap();

        // 300 * 15 / 29 = 155.17 and 100 * 15 / 29 = 51.72
        assert_eq!(report.total_budget, dec!(206.89));
        assert_eq!(report.total_spent, dec!(145.55));
        assert_eq!(report.total_saved, dec!(50));
        assert_eq!(
            report.total_difference,
            report.total_budget - report.total_spent
        );
        assert_eq!(row(&report.categories, "Groceries").transaction_count, 2);
        assert_eq!(row(&report.categories, "Dining Out").status, CategoryStatus::Over);
    }

    #[test]
    fn rows_are_sorted_by_spending() {
        let store = StubReportStore {
            budgets: vec![Budget::new("Aaa", dec!(10)).unwrap()],
            expenses: vec![
                (date!(2024 - 02 - 01), "Small", dec!(1)),
                (date!(2024 - 02 - 01), "Big", dec!(100)),
            ],
            ..Default::default()
        };

        let report = build_monthly_report(&store, USER, february()).unwrap();

        let categories: Vec<_> = report
            .categories
            .iter()
            .map(|row| row.category.as_str())
            .collect();
        assert_eq!(categories, ["Big", "Small", "Aaa"]);
    }

    #[test]
    fn december_includes_new_years_eve_only() {
        let store = StubReportStore {
            expenses: vec![
                (date!(2024 - 12 - 31), "Party", dec!(80)),
                (date!(2025 - 01 - 01), "Party", dec!(20)),
            ],
            ..Default::default()
        };

        let report =
            build_monthly_report(&store, USER, YearMonth::new(2024, 12).unwrap()).unwrap();

        assert_eq!(report.total_spent, dec!(80));
    }

    #[test]
    fn spending_too_large_for_its_budget_is_an_error() {
        let store = StubReportStore {
            budgets: vec![Budget::new("Gifts", dec!(0.01)).unwrap()],
            expenses: vec![(
                date!(2024 - 02 - 10),
                "Gifts",
                Decimal::from_i128_with_scale(10_i128.pow(27), 0),
            )],
            ..Default::default()
        };

        let result = build_monthly_report(&store, USER, february());

        assert_eq!(result, Err(Error::AmountOverflow));
    }

    #[test]
    fn malformed_token_fails_before_store_access() {
        let store = StubReportStore::default();

        for token in ["2024-13", "2024-00", "24-01", "2024-1", "2024/01", "abcd-ef", ""] {
            let result = build_monthly_report_for_token(&store, USER, token);

            assert!(
                matches!(result, Err(Error::InvalidArgument(_))),
                "token {token:?} should be rejected"
            );
        }
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn serializes_with_client_field_names() {
        let store = StubReportStore {
            budgets: vec![Budget::new("Groceries", dec!(100)).unwrap()],
            expenses: vec![(date!(2024 - 02 - 10), "Groceries", dec!(85))],
            ..Default::default()
        };
        let report = build_monthly_report(&store, USER, february()).unwrap();

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["month"], "2024-02");
        assert_eq!(json["categories"][0]["budget"], 100.0);
        assert_eq!(json["categories"][0]["status"], "warning");
        assert_eq!(json["categories"][0]["transaction_count"], 1);
        assert_eq!(json["total_difference"], 15.0);
    }
}
