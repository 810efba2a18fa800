//! Reports derived from budgets, expenses and savings.
//!
//! The calendar-month reports ([build_monthly_report], [build_dashboard] and
//! [budget_vs_actual]) scale each monthly budget with [prorate] so the month a
//! user started tracking is only held to the days they tracked. The learning
//! period is a separate fixed window that suggests budgets from early spending.
//!
//! Builders read through the [ReportStore] trait and take "today" as an
//! argument, so the HTTP handlers capture the date once per request.

mod aggregation;
mod dashboard;
mod handlers;
mod learning_period;
mod monthly;
mod proration;
mod store;
mod visualizations;

pub use aggregation::{CategoryAggregate, aggregate_categories, aggregate_month};
pub use dashboard::{Dashboard, DashboardRow, DashboardStatus, build_dashboard};
pub use handlers::{
    BreakdownQuery, ReportState, get_available_months, get_budget_vs_actual,
    get_category_breakdown, get_dashboard, get_learning_period_analysis,
    get_learning_period_status, get_monthly_report, get_monthly_trends,
};
pub use learning_period::{
    DEFAULT_LEARNING_PERIOD_DAYS, LearningPeriodAnalysis, LearningPeriodStatus,
    analyse_learning_period, learning_period_status,
};
pub use monthly::{
    CategoryReportRow, CategoryStatus, MonthlyReport, available_months, build_monthly_report,
    build_monthly_report_for_token,
};
pub use proration::prorate;
pub use store::{ReportStore, SQLiteReportStore};
pub use visualizations::{
    BudgetComparison, CategoryTotal, MonthlyTotal, TREND_MONTHS, budget_vs_actual,
    category_breakdown, monthly_trends,
};
