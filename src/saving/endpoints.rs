use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::UserID,
    calendar::parse_date,
    database_id::DatabaseId,
    db::lock_connection,
    money::AmountInput,
    saving::core::{NewSaving, Saving, create_saving, delete_saving, get_savings},
};

/// The state needed for the saving endpoints.
#[derive(Debug, Clone)]
pub struct SavingState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body for recording a saving.
#[derive(Debug, Clone, Deserialize)]
pub struct SavingForm {
    /// The day of the saving, `YYYY-MM-DD`.
    pub date: String,
    /// The amount saved as a number or numeric string.
    pub amount: AmountInput,
    /// An optional note.
    #[serde(default)]
    pub description: Option<String>,
}

/// List the user's savings, newest first.
pub async fn get_savings_endpoint(
    State(state): State<SavingState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Saving>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_savings(user_id, &connection).map(Json)
}

/// Record a saving and respond with its ID.
pub async fn create_saving_endpoint(
    State(state): State<SavingState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<SavingForm>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let new_saving = NewSaving::new(
        parse_date(&form.date)?,
        form.amount.to_decimal()?,
        form.description.as_deref().unwrap_or_default(),
    )?;

    let connection = lock_connection(&state.db_connection)?;
    let saving = create_saving(user_id, &new_saving, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": saving.id })),
    ))
}

/// Delete one of the user's savings.
pub async fn delete_saving_endpoint(
    State(state): State<SavingState>,
    Extension(user_id): Extension<UserID>,
    Path(saving_id): Path<DatabaseId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_saving(user_id, saving_id, &connection)?;

    Ok(Json(json!({ "success": true })))
}
