//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{delete, get, post},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, get_me, post_log_in, post_log_out, register_user},
    budget::{get_budgets_endpoint, replace_budgets_endpoint},
    endpoints,
    expense::{create_expense_endpoint, delete_expense_endpoint, get_expenses_endpoint},
    report::{
        get_available_months, get_budget_vs_actual, get_category_breakdown, get_dashboard,
        get_learning_period_analysis, get_learning_period_status, get_monthly_report,
        get_monthly_trends,
    },
    saving::{create_saving_endpoint, delete_saving_endpoint, get_savings_endpoint},
    savings_goal::{
        add_to_savings_goal_endpoint, archive_savings_goal_endpoint, create_savings_goal_endpoint,
        delete_savings_goal_endpoint, get_savings_goals_endpoint,
    },
    settings::{get_tracking_start_date_endpoint, set_tracking_start_date_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::ME, get(get_me));

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::MONTHLY_REPORT, get(get_monthly_report))
        .route(endpoints::AVAILABLE_MONTHS, get(get_available_months))
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(replace_budgets_endpoint),
        )
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .route(
            endpoints::SAVINGS,
            get(get_savings_endpoint).post(create_saving_endpoint),
        )
        .route(endpoints::SAVING, delete(delete_saving_endpoint))
        .route(
            endpoints::SAVINGS_GOALS,
            get(get_savings_goals_endpoint).post(create_savings_goal_endpoint),
        )
        .route(endpoints::SAVINGS_GOAL, delete(delete_savings_goal_endpoint))
        .route(
            endpoints::ADD_TO_SAVINGS_GOAL,
            post(add_to_savings_goal_endpoint),
        )
        .route(
            endpoints::ARCHIVE_SAVINGS_GOAL,
            post(archive_savings_goal_endpoint),
        )
        .route(
            endpoints::TRACKING_START_DATE,
            get(get_tracking_start_date_endpoint).post(set_tracking_start_date_endpoint),
        )
        .route(
            endpoints::LEARNING_PERIOD_STATUS,
            get(get_learning_period_status),
        )
        .route(
            endpoints::LEARNING_PERIOD_ANALYSIS,
            get(get_learning_period_analysis),
        )
        .route(endpoints::MONTHLY_TRENDS, get(get_monthly_trends))
        .route(endpoints::CATEGORY_BREAKDOWN, get(get_category_breakdown))
        .route(endpoints::BUDGET_VS_ACTUAL, get(get_budget_vs_actual))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found(uri: Uri) -> Error {
    tracing::debug!("no route for {uri}");
    Error::NotFound
}
