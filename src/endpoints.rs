//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The route for the current month's dashboard.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the report for one month, e.g. '/api/reports/monthly/2024-02'.
pub const MONTHLY_REPORT: &str = "/api/reports/monthly/{month}";
/// The route listing the months that have expenses.
pub const AVAILABLE_MONTHS: &str = "/api/reports/available-months";
/// The route to read and replace budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to delete an expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to list and create savings.
pub const SAVINGS: &str = "/api/savings";
/// The route to delete a saving.
pub const SAVING: &str = "/api/savings/{saving_id}";
/// The route to list and create savings goals.
pub const SAVINGS_GOALS: &str = "/api/savings-goals";
/// The route to delete a savings goal.
pub const SAVINGS_GOAL: &str = "/api/savings-goals/{goal_id}";
/// The route to add money to a savings goal.
pub const ADD_TO_SAVINGS_GOAL: &str = "/api/savings-goals/{goal_id}/add";
/// The route to archive a savings goal.
pub const ARCHIVE_SAVINGS_GOAL: &str = "/api/savings-goals/{goal_id}/archive";
/// The route to read and set the tracking start date.
pub const TRACKING_START_DATE: &str = "/api/settings/tracking-start-date";
/// The route for the learning period status.
pub const LEARNING_PERIOD_STATUS: &str = "/api/learning-period/status";
/// The route for the learning period analysis.
pub const LEARNING_PERIOD_ANALYSIS: &str = "/api/learning-period/analysis";
/// The route for spending per month over the last year.
pub const MONTHLY_TRENDS: &str = "/api/visualizations/monthly-trends";
/// The route for spending per category.
pub const CATEGORY_BREAKDOWN: &str = "/api/visualizations/category-breakdown";
/// The route for this month's budgets against spending.
pub const BUDGET_VS_ACTUAL: &str = "/api/visualizations/budget-vs-actual";

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route describing the current session.
pub const ME: &str = "/api/auth/me";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/expenses/{expense_id}', '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
