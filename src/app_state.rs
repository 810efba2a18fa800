//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_COOKIE_DURATION, SignupPolicy},
    db::initialize,
    report::DEFAULT_LEARNING_PERIOD_DAYS,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Decides which calendar day "today" is for reports.
    pub local_timezone: String,

    /// Length of the learning period in days.
    pub learning_period_days: u16,

    /// Decides who may register.
    pub signup_policy: Arc<dyn SignupPolicy>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// The learning period defaults to [DEFAULT_LEARNING_PERIOD_DAYS] days, use
    /// [AppState::with_learning_period_days] to change it.
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is not a canonical timezone name or the
    /// database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        signup_policy: Arc<dyn SignupPolicy>,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            learning_period_days: DEFAULT_LEARNING_PERIOD_DAYS,
            signup_policy,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Set the length of the learning period.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if `days` is zero.
    pub fn with_learning_period_days(mut self, days: u16) -> Result<Self, Error> {
        if days == 0 {
            return Err(Error::InvalidArgument(
                "the learning period must be at least one day".to_owned(),
            ));
        }

        self.learning_period_days = days;
        Ok(self)
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusqlite::Connection;

    use crate::{AppState, Error, auth::Allowlist};

    #[test]
    fn rejects_unknown_timezone() {
        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            "secret",
            "Not/A_Zone",
            Arc::new(Allowlist::default()),
        );

        assert_eq!(
            result.map(|state| state.local_timezone),
            Err(Error::InvalidTimezoneError("Not/A_Zone".to_owned()))
        );
    }

    #[test]
    fn rejects_empty_learning_period() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "secret",
            "Etc/UTC",
            Arc::new(Allowlist::default()),
        )
        .unwrap();

        assert!(matches!(
            state.with_learning_period_days(0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
