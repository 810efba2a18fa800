//! JSON endpoints for listing, creating and deleting expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::UserID,
    calendar::{parse_date, parse_optional_date},
    database_id::DatabaseId,
    db::lock_connection,
    expense::core::{Expense, NewExpense, create_expense, delete_expense, get_expenses},
    money::AmountInput,
};

/// The state needed for the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Optional inclusive date bounds for listing expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    /// Earliest date to include, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Latest date to include, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// The body for creating an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseForm {
    /// The day of the expense, `YYYY-MM-DD`.
    pub date: String,
    /// The spending category.
    pub category: String,
    /// The amount spent as a number or numeric string.
    pub amount: AmountInput,
    /// An optional note.
    #[serde(default)]
    pub description: Option<String>,
}

/// List the user's expenses, newest first.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, Error> {
    let start = parse_optional_date(query.start_date.as_deref())?;
    let end = parse_optional_date(query.end_date.as_deref())?;

    let connection = lock_connection(&state.db_connection)?;

    get_expenses(user_id, start, end, &connection).map(Json)
}

/// Create an expense and respond with its ID.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<ExpenseForm>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let new_expense = NewExpense::new(
        parse_date(&form.date)?,
        &form.category,
        form.amount.to_decimal()?,
        form.description.as_deref().unwrap_or_default(),
    )
    .inspect_err(|error| tracing::warn!("rejected expense from user {user_id}: {error}"))?;

    let connection = lock_connection(&state.db_connection)?;
    let expense = create_expense(user_id, &new_expense, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": expense.id })),
    ))
}

/// Delete one of the user's expenses.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<DatabaseId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_expense(user_id, expense_id, &connection)?;

    Ok(Json(json!({ "success": true })))
}
