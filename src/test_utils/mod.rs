#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, response::Response};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState,
    auth::{Allowlist, PasswordHash, User, create_user},
    db::initialize,
};

/// A password strong enough to pass validation.
pub(crate) const TEST_PASSWORD: &str = "correct horse battery staple";

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");

    connection
}

#[track_caller]
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    let password_hash =
        PasswordHash::from_raw_password(TEST_PASSWORD, 4).expect("could not hash password");

    create_user(username, password_hash, connection).expect("could not create test user")
}

pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");

    AppState::new(
        connection,
        "42",
        "Etc/UTC",
        Arc::new(Allowlist::new(["cole"])),
    )
    .expect("could not create app state")
}

#[track_caller]
pub(crate) fn insert_test_user(username: &str, state: &AppState) -> User {
    let connection = state
        .db_connection
        .lock()
        .expect("could not acquire database lock");

    create_test_user(username, &connection)
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not get response body");

    serde_json::from_slice(&body).expect("response body is not JSON")
}
