//! JSON endpoints for the dashboard, reports, learning period and charts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    calendar::{YearMonth, parse_optional_date},
    db::lock_connection,
    report::{
        dashboard::{Dashboard, build_dashboard},
        learning_period::{
            LearningPeriodAnalysis, LearningPeriodStatus, analyse_learning_period,
            learning_period_status,
        },
        monthly::{MonthlyReport, available_months, build_monthly_report_for_token},
        store::SQLiteReportStore,
        visualizations::{
            BudgetComparison, CategoryTotal, MonthlyTotal, budget_vs_actual, category_breakdown,
            monthly_trends,
        },
    },
    timezone::local_today,
};

/// The state needed for the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone that decides what "today" is, as a canonical name.
    pub local_timezone: String,
    /// The length of the learning period in days.
    pub learning_period_days: u16,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            learning_period_days: state.learning_period_days,
        }
    }
}

/// Optional inclusive date bounds for the category breakdown.
#[derive(Debug, Default, Deserialize)]
pub struct BreakdownQuery {
    /// Earliest date to include, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Latest date to include, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// The current month's budgets against spending.
pub async fn get_dashboard(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Dashboard>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let store = SQLiteReportStore::new(&connection);

    build_dashboard(&store, user_id, today, state.learning_period_days).map(Json)
}

/// The report for the month in the path, e.g. `/api/reports/monthly/2024-02`.
pub async fn get_monthly_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Path(month): Path<String>,
) -> Result<Json<MonthlyReport>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let store = SQLiteReportStore::new(&connection);

    build_monthly_report_for_token(&store, user_id, &month)
        .inspect_err(|error| {
            tracing::warn!("could not build monthly report for {month:?}: {error}");
        })
        .map(Json)
}

/// The months with at least one expense, oldest first.
pub async fn get_available_months(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<YearMonth>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    available_months(&SQLiteReportStore::new(&connection), user_id).map(Json)
}

/// How far through the learning period the user is.
pub async fn get_learning_period_status(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<LearningPeriodStatus>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let store = SQLiteReportStore::new(&connection);

    learning_period_status(&store, user_id, today, state.learning_period_days).map(Json)
}

/// Spending during the learning period with suggested budgets.
pub async fn get_learning_period_analysis(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<LearningPeriodAnalysis>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;
    let store = SQLiteReportStore::new(&connection);

    analyse_learning_period(&store, user_id, today, state.learning_period_days).map(Json)
}

/// Spending per month over the last year.
pub async fn get_monthly_trends(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    monthly_trends(&SQLiteReportStore::new(&connection), user_id, today).map(Json)
}

/// Spending per category, optionally between two dates.
pub async fn get_category_breakdown(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let start = parse_optional_date(query.start_date.as_deref())?;
    let end = parse_optional_date(query.end_date.as_deref())?;

    let connection = lock_connection(&state.db_connection)?;

    category_breakdown(&SQLiteReportStore::new(&connection), user_id, start, end).map(Json)
}

/// This month's prorated budgets against actual spending.
pub async fn get_budget_vs_actual(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<BudgetComparison>>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    budget_vs_actual(&SQLiteReportStore::new(&connection), user_id, today).map(Json)
}
