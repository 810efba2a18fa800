//! Handler for creating new accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, SignupPolicy, ValidatedPassword,
        cookie::set_auth_cookie,
        user::{create_user, normalize_username},
    },
    db::lock_connection,
};

/// bcrypt cost for new accounts. Tests use the minimum so they stay fast.
const PASSWORD_COST: u32 = if cfg!(test) {
    4
} else {
    PasswordHash::DEFAULT_COST
};

/// The state needed to register a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// Decides which usernames may register.
    pub signup_policy: Arc<dyn SignupPolicy>,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            signup_policy: state.signup_policy.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data for creating an account.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The username to register.
    pub username: String,
    /// The password in plain text.
    pub password: String,
}

/// Create an account and log the new user in.
///
/// # Errors
/// Returns:
/// - [Error::SignupNotAllowed] if the signup policy rejects the username,
/// - [Error::TooWeak] if the password is easy to guess,
/// - [Error::DuplicateUsername] if the username is taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, PrivateCookieJar, Json<Value>), Error> {
    let username = normalize_username(&form.username);

    if username.is_empty() {
        return Err(Error::InvalidArgument("username cannot be empty".to_owned()));
    }

    if !state.signup_policy.allows(&username) {
        tracing::warn!("rejected registration for {username}");
        return Err(Error::SignupNotAllowed(username));
    }

    let password = ValidatedPassword::new(&form.password, &[&username])?;
    let password_hash = PasswordHash::new(password, PASSWORD_COST)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        create_user(&username, password_hash, &connection)?
    };

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;
    tracing::info!("registered user {} with ID {}", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "success": true, "username": user.username })),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Json, extract::State, http::StatusCode};
    use axum_extra::extract::PrivateCookieJar;

    use crate::{
        Error,
        auth::{
            Allowlist, RegisterForm, RegistrationState, cookie::get_token_from_cookies,
            register_user, user::get_user_by_username,
        },
        test_utils::{TEST_PASSWORD, get_test_app_state},
    };

    fn get_state() -> RegistrationState {
        let mut state = get_test_app_state();
        state.signup_policy = Arc::new(Allowlist::new(["cole", "natalie"]));
        axum::extract::FromRef::from_ref(&state)
    }

    fn form(username: &str, password: &str) -> Json<RegisterForm> {
        Json(RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    #[tokio::test]
    async fn allowed_user_can_register() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let (status, jar, Json(body)) =
            register_user(State(state.clone()), jar, form("Natalie", TEST_PASSWORD))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "natalie");
        let user = get_user_by_username("natalie", &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(get_token_from_cookies(&jar).unwrap().user_id, user.id);
        assert_eq!(user.password_hash.verify(TEST_PASSWORD), Ok(true));
    }

    #[tokio::test]
    async fn username_outside_allowlist_is_forbidden() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = register_user(State(state), jar, form("mallory", TEST_PASSWORD)).await;

        assert_eq!(
            result.map(|_| ()),
            Err(Error::SignupNotAllowed("mallory".to_owned()))
        );
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = register_user(State(state), jar, form("cole", "password1")).await;

        assert!(matches!(result.map(|_| ()), Err(Error::TooWeak(_))));
    }

    #[tokio::test]
    async fn second_registration_is_a_conflict() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        register_user(State(state.clone()), jar.clone(), form("cole", TEST_PASSWORD))
            .await
            .unwrap();

        let result = register_user(State(state), jar, form("COLE", TEST_PASSWORD)).await;

        assert_eq!(result.map(|_| ()), Err(Error::DuplicateUsername));
    }
}
