//! Per-user settings: the tracking start date and the learning period start date.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    calendar::{iso_date, parse_optional_date},
    db::lock_connection,
};

/// The settings stored for each user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Spending before this date is not compared against budgets.
    #[serde(with = "iso_date::option")]
    pub tracking_start_date: Option<Date>,
    /// The first day of the learning period, set on first use.
    #[serde(with = "iso_date::option")]
    pub learning_start_date: Option<Date>,
}

/// Create the settings table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_settings (
                user_id INTEGER PRIMARY KEY,
                tracking_start_date TEXT,
                learning_start_date TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Get the settings for `user_id`, or the defaults if none have been saved.
pub fn get_settings(user_id: UserID, connection: &Connection) -> Result<UserSettings, Error> {
    let settings = connection
        .query_row(
            "SELECT tracking_start_date, learning_start_date FROM user_settings WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| {
                Ok(UserSettings {
                    tracking_start_date: row.get(0)?,
                    learning_start_date: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(settings.unwrap_or_default())
}

/// Replace all settings for `user_id`.
pub fn save_settings(
    user_id: UserID,
    settings: &UserSettings,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_settings (user_id, tracking_start_date, learning_start_date)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                tracking_start_date = excluded.tracking_start_date,
                learning_start_date = excluded.learning_start_date",
        (
            user_id.as_i64(),
            settings.tracking_start_date,
            settings.learning_start_date,
        ),
    )?;

    Ok(())
}

/// Set or clear (`None`) the date budgets are tracked from.
pub fn set_tracking_start_date(
    user_id: UserID,
    tracking_start_date: Option<Date>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_settings (user_id, tracking_start_date) VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET tracking_start_date = excluded.tracking_start_date",
        (user_id.as_i64(), tracking_start_date),
    )?;

    Ok(())
}

/// Get the learning period start date, storing `today` as the start date if there is none yet.
pub fn get_or_create_learning_start_date(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Date, Error> {
    if let Some(start_date) = get_settings(user_id, connection)?.learning_start_date {
        return Ok(start_date);
    }

    connection.execute(
        "INSERT INTO user_settings (user_id, learning_start_date) VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET learning_start_date = excluded.learning_start_date",
        (user_id.as_i64(), today),
    )?;
    tracing::debug!("started learning period for user {user_id} on {today}");

    Ok(today)
}

/// The state needed to read and change settings.
#[derive(Debug, Clone)]
pub struct SettingsState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body for setting the tracking start date. `null` clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingStartForm {
    /// A `YYYY-MM-DD` date, or `null`.
    pub tracking_start_date: Option<String>,
}

/// Respond with `{"tracking_start_date": "YYYY-MM-DD" | null}`.
pub async fn get_tracking_start_date_endpoint(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let settings = get_settings(user_id, &connection)?;

    Ok(Json(json!({
        "tracking_start_date": settings.tracking_start_date.map(|date| date.to_string()),
    })))
}

/// Set or clear the tracking start date.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the date is not a valid `YYYY-MM-DD` date.
pub async fn set_tracking_start_date_endpoint(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TrackingStartForm>,
) -> Result<Json<Value>, Error> {
    let tracking_start_date = parse_optional_date(form.tracking_start_date.as_deref())?;

    let connection = lock_connection(&state.db_connection)?;
    set_tracking_start_date(user_id, tracking_start_date, &connection)?;
    tracing::info!("user {user_id} set tracking start date to {tracking_start_date:?}");

    Ok(Json(json!({
        "success": true,
        "tracking_start_date": tracking_start_date.map(|date| date.to_string()),
    })))
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Json, extract::State};
    use time::macros::date;

    use crate::{
        Error,
        settings::{
            SettingsState, TrackingStartForm, UserSettings, get_or_create_learning_start_date,
            get_settings, get_tracking_start_date_endpoint, save_settings,
            set_tracking_start_date, set_tracking_start_date_endpoint,
        },
        test_utils::{create_test_user, get_test_connection, get_test_app_state, insert_test_user},
    };

    #[test]
    fn defaults_when_nothing_saved() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);

        assert_eq!(
            get_settings(user.id, &connection),
            Ok(UserSettings::default())
        );
    }

    #[test]
    fn tracking_start_can_be_set_and_cleared() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);

        set_tracking_start_date(user.id, Some(date!(2024 - 02 - 15)), &connection).unwrap();
        assert_eq!(
            get_settings(user.id, &connection).unwrap().tracking_start_date,
            Some(date!(2024 - 02 - 15))
        );

        set_tracking_start_date(user.id, None, &connection).unwrap();
        assert_eq!(
            get_settings(user.id, &connection).unwrap().tracking_start_date,
            None
        );
    }

    #[test]
    fn learning_start_is_created_once() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);

        let first =
            get_or_create_learning_start_date(user.id, date!(2024 - 03 - 01), &connection).unwrap();
        let second =
            get_or_create_learning_start_date(user.id, date!(2024 - 03 - 09), &connection).unwrap();

        assert_eq!(first, date!(2024 - 03 - 01));
        assert_eq!(second, date!(2024 - 03 - 01));
    }

    #[test]
    fn setting_tracking_start_keeps_learning_start() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);
        get_or_create_learning_start_date(user.id, date!(2024 - 03 - 01), &connection).unwrap();

        set_tracking_start_date(user.id, Some(date!(2024 - 04 - 01)), &connection).unwrap();

        assert_eq!(
            get_settings(user.id, &connection),
            Ok(UserSettings {
                tracking_start_date: Some(date!(2024 - 04 - 01)),
                learning_start_date: Some(date!(2024 - 03 - 01)),
            })
        );
    }

    #[test]
    fn settings_are_per_user() {
        let connection = get_test_connection();
        let cole = create_test_user("cole", &connection);
        let natalie = create_test_user("natalie", &connection);
        let settings = UserSettings {
            tracking_start_date: Some(date!(2024 - 01 - 10)),
            learning_start_date: None,
        };

        save_settings(cole.id, &settings, &connection).unwrap();

        assert_eq!(get_settings(cole.id, &connection), Ok(settings));
        assert_eq!(
            get_settings(natalie.id, &connection),
            Ok(UserSettings::default())
        );
    }

    #[test]
    fn serializes_dates_as_iso_strings() {
        let settings = UserSettings {
            tracking_start_date: Some(date!(2024 - 02 - 15)),
            learning_start_date: None,
        };

        let json = serde_json::to_value(settings).unwrap();

        assert_eq!(json["tracking_start_date"], "2024-02-15");
        assert!(json["learning_start_date"].is_null());
    }

    #[tokio::test]
    async fn endpoint_sets_and_reads_tracking_start() {
        let app_state = get_test_app_state();
        let user = insert_test_user("cole", &app_state);
        let state: SettingsState = axum::extract::FromRef::from_ref(&app_state);

        set_tracking_start_date_endpoint(
            State(state.clone()),
            Extension(user.id),
            Json(TrackingStartForm {
                tracking_start_date: Some("2024-02-15".to_owned()),
            }),
        )
        .await
        .unwrap();
        let Json(body) = get_tracking_start_date_endpoint(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(body["tracking_start_date"], "2024-02-15");
    }

    #[tokio::test]
    async fn endpoint_rejects_malformed_date() {
        let app_state = get_test_app_state();
        let user = insert_test_user("cole", &app_state);
        let state: SettingsState = axum::extract::FromRef::from_ref(&app_state);

        let result = set_tracking_start_date_endpoint(
            State(state),
            Extension(user.id),
            Json(TrackingStartForm {
                tracking_start_date: Some("15/02/2024".to_owned()),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
