//! Handlers for logging in and asking who is logged in.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::{get_token_from_cookies, set_auth_cookie},
        user::{get_user_by_id, get_user_by_username},
    },
    db::lock_connection,
};

/// How long the auth cookie should last if the user asks to be remembered.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to log a user in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The account's username.
    pub username: String,
    /// The account's password in plain text.
    pub password: String,
    /// Keep the session alive for a week instead of the default duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests.
///
/// Sets the auth cookie and responds with the username on success.
///
/// # Errors
/// Returns [Error::InvalidCredentials] if the username is unknown or the password is wrong.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(credentials): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_username(&credentials.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::warn!("log-in attempt for unknown user {}", credentials.username);
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&credentials.password)? {
        tracing::warn!("incorrect password for user {}", user.username);
        return Err(Error::InvalidCredentials);
    }

    let duration = if credentials.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, duration)?;
    tracing::info!("user {} logged in", user.username);

    Ok((
        jar,
        Json(json!({ "success": true, "username": user.username })),
    ))
}

/// Report whether the request carries a valid session and for which user.
///
/// Always succeeds so the client can use it to decide between the log-in
/// page and the app.
pub async fn get_me(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
) -> Result<Json<Value>, Error> {
    let Ok(token) = get_token_from_cookies(&jar) else {
        return Ok(Json(json!({ "logged_in": false, "username": null })));
    };

    let connection = lock_connection(&state.db_connection)?;

    match get_user_by_id(token.user_id, &connection) {
        Ok(user) => Ok(Json(json!({ "logged_in": true, "username": user.username }))),
        Err(Error::NotFound) => Ok(Json(json!({ "logged_in": false, "username": null }))),
        Err(error) => Err(error),
    }
}
