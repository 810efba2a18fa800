//! JSON endpoints for savings goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::DatabaseId,
    db::lock_connection,
    money::AmountInput,
    savings_goal::core::{
        NewSavingsGoal, SavingsGoal, add_to_savings_goal, archive_savings_goal,
        create_savings_goal, delete_savings_goal, get_savings_goals,
    },
};

/// The state needed for the savings goal endpoints.
#[derive(Debug, Clone)]
pub struct SavingsGoalState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A goal as sent to clients, with its progress worked out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsGoalView {
    #[serde(flatten)]
    goal: SavingsGoal,
    progress_percentage: Decimal,
}

impl From<SavingsGoal> for SavingsGoalView {
    fn from(goal: SavingsGoal) -> Self {
        Self {
            progress_percentage: goal.progress_percentage(),
            goal,
        }
    }
}

/// Optionally list only archived (`true`) or only active (`false`) goals.
#[derive(Debug, Default, Deserialize)]
pub struct SavingsGoalQuery {
    /// Filter on the archived flag.
    pub archived: Option<bool>,
}

/// The body for creating a goal.
#[derive(Debug, Clone, Deserialize)]
pub struct SavingsGoalForm {
    /// What the user is saving for.
    pub name: String,
    /// How much the user wants to save.
    pub target_amount: AmountInput,
}

/// The body for adding money to a goal.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToGoalForm {
    /// How much to add.
    pub amount: AmountInput,
}

/// List the user's goals, newest first.
pub async fn get_savings_goals_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SavingsGoalQuery>,
) -> Result<Json<Vec<SavingsGoalView>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let goals = get_savings_goals(user_id, query.archived, &connection)?;

    Ok(Json(goals.into_iter().map(SavingsGoalView::from).collect()))
}

/// Create a goal and respond with its ID.
pub async fn create_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<SavingsGoalForm>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let new_goal = NewSavingsGoal::new(&form.name, form.target_amount.to_decimal()?)?;

    let connection = lock_connection(&state.db_connection)?;
    let goal = create_savings_goal(user_id, &new_goal, OffsetDateTime::now_utc(), &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": goal.id })),
    ))
}

/// Add money to a goal. The response says whether the goal is now complete.
pub async fn add_to_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseId>,
    Json(form): Json<AddToGoalForm>,
) -> Result<Json<Value>, Error> {
    let amount = form.amount.to_positive_decimal("amount")?;

    let connection = lock_connection(&state.db_connection)?;
    let (goal, completed) = add_to_savings_goal(
        user_id,
        goal_id,
        amount,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    if completed {
        tracing::info!("user {user_id} completed savings goal {}", goal.name);
    }

    Ok(Json(json!({
        "success": true,
        "completed": completed,
        "goal": SavingsGoalView::from(goal),
    })))
}

/// Archive a goal.
pub async fn archive_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let goal = archive_savings_goal(user_id, goal_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(Json(json!({
        "success": true,
        "goal": SavingsGoalView::from(goal),
    })))
}

/// Delete a goal.
pub async fn delete_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_savings_goal(user_id, goal_id, &connection)?;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Json,
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rust_decimal_macros::dec;

    use crate::{
        UserID,
        money::AmountInput,
        savings_goal::{
            AddToGoalForm, SavingsGoalForm, SavingsGoalQuery, SavingsGoalState,
            add_to_savings_goal_endpoint, archive_savings_goal_endpoint,
            create_savings_goal_endpoint, get_savings_goals_endpoint,
        },
        test_utils::{get_test_app_state, insert_test_user},
    };

    fn get_state() -> (SavingsGoalState, UserID) {
        let app_state = get_test_app_state();
        let user = insert_test_user("cole", &app_state);

        (axum::extract::FromRef::from_ref(&app_state), user.id)
    }

    async fn create_goal(state: &SavingsGoalState, user_id: UserID, target: &str) -> i64 {
        let (_, Json(body)) = create_savings_goal_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(SavingsGoalForm {
                name: "Holiday".to_owned(),
                target_amount: AmountInput::Text(target.to_owned()),
            }),
        )
        .await
        .unwrap();

        body["id"].as_i64().unwrap()
    }

    fn add(amount: &str) -> Json<AddToGoalForm> {
        Json(AddToGoalForm {
            amount: AmountInput::Text(amount.to_owned()),
        })
    }

    #[tokio::test]
    async fn listing_includes_progress() {
        let (state, user_id) = get_state();
        let goal_id = create_goal(&state, user_id, "300").await;
        add_to_savings_goal_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(goal_id),
            add("100"),
        )
        .await
        .unwrap();

        let Json(goals) = get_savings_goals_endpoint(
            State(state),
            Extension(user_id),
            Query(SavingsGoalQuery::default()),
        )
        .await
        .unwrap();

        let json = serde_json::to_value(&goals).unwrap();
        assert_eq!(json[0]["name"], "Holiday");
        assert_eq!(json[0]["progress_percentage"], 33.3);
        assert_eq!(json[0]["archived"], false);
        assert!(json[0]["completed_at"].is_null());
    }

    #[tokio::test]
    async fn reaching_target_reports_completion() {
        let (state, user_id) = get_state();
        let goal_id = create_goal(&state, user_id, "50").await;

        let Json(body) = add_to_savings_goal_endpoint(
            State(state),
            Extension(user_id),
            Path(goal_id),
            add("75.25"),
        )
        .await
        .unwrap();

        assert_eq!(body["completed"], true);
        assert_eq!(body["goal"]["archived"], true);
        assert_eq!(body["goal"]["progress_percentage"], 100.0);
    }

    #[tokio::test]
    async fn adding_to_archived_goal_is_a_bad_request() {
        let (state, user_id) = get_state();
        let goal_id = create_goal(&state, user_id, "50").await;
        archive_savings_goal_endpoint(State(state.clone()), Extension(user_id), Path(goal_id))
            .await
            .unwrap();

        let error = add_to_savings_goal_endpoint(
            State(state),
            Extension(user_id),
            Path(goal_id),
            add("5"),
        )
        .await
        .unwrap_err();

        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn zero_target_is_rejected() {
        let (state, user_id) = get_state();

        let result = create_savings_goal_endpoint(
            State(state),
            Extension(user_id),
            Json(SavingsGoalForm {
                name: "Nothing".to_owned(),
                target_amount: AmountInput::from(dec!(0)),
            }),
        )
        .await;

        assert!(result.is_err());
    }
}
