//! JSON endpoints for reading and replacing budgets.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::UserID,
    budget::core::{get_budgets, parse_budget_map, replace_budgets},
    db::lock_connection,
    money::AmountInput,
};

/// The state needed for the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond with the user's budgets as a `{category: monthly_limit}` map.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<BTreeMap<String, Decimal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let budgets = get_budgets(user_id, &connection)?
        .into_iter()
        .map(|budget| (budget.category, budget.monthly_limit))
        .collect();

    Ok(Json(budgets))
}

/// Replace all of the user's budgets with the `{category: monthly_limit}` map in the body.
///
/// # Errors
/// Returns [Error::InvalidArgument] if a category is empty or a limit is negative or
/// not a number. Nothing is changed in that case.
pub async fn replace_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Json(raw_budgets): Json<BTreeMap<String, AmountInput>>,
) -> Result<Json<Value>, Error> {
    let budgets = parse_budget_map(&raw_budgets).inspect_err(|error| {
        tracing::warn!("rejected budgets from user {user_id}: {error}");
    })?;

    let connection = lock_connection(&state.db_connection)?;
    replace_budgets(user_id, &budgets, &connection)?;
    tracing::info!("user {user_id} saved {} budgets", budgets.len());

    Ok(Json(json!({ "success": true })))
}
