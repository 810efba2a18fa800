//! A personal finance tracker.
//!
//! Users log expenses and one-off savings, set per-category monthly budgets,
//! track savings goals and view reports derived from that data.
//!
//! This library provides a JSON REST API. The interesting part is the
//! [report] module, which prorates monthly budgets against the date a user
//! started tracking and reconciles them against grouped expenses.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
pub mod backup;
pub mod budget;
pub mod calendar;
mod database_id;
mod db;
pub mod endpoints;
pub mod expense;
mod logging;
pub mod money;
pub mod report;
mod routing;
pub mod saving;
pub mod savings_goal;
pub mod settings;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Allowlist, PasswordHash, SignupPolicy, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent a value that could not be parsed or is out of range,
    /// e.g. a malformed `YYYY-MM` token or a negative budget.
    #[error("{0}")]
    InvalidArgument(String),

    /// The username and password combination did not match a user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("you must be logged in to do that")]
    Unauthorized,

    /// The signup policy rejected the username.
    #[error("registration is not open for \"{0}\"")]
    SignupNotAllowed(String),

    /// The username is already registered.
    #[error("that username is already taken")]
    DuplicateUsername,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found as well.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Money cannot be added to a goal that has been archived.
    #[error("the savings goal has been archived")]
    GoalArchived,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The configured timezone is not a canonical timezone name.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The auth token could not be created or serialized.
    #[error("could not create the auth token: {0}")]
    TokenError(String),

    /// A sum, product or quotient of amounts does not fit in a decimal.
    #[error("the amounts involved are too large to calculate with")]
    AmountOverflow,

    /// A backup file could not be read, written or parsed.
    #[error("backup file error: {0}")]
    BackupFileError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) | Error::TooWeak(_) | Error::GoalArchived => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::SignupNotAllowed(_) => StatusCode::FORBIDDEN,
            Error::DuplicateUsername => StatusCode::CONFLICT,
            Error::AmountOverflow => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
