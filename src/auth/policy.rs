//! Who may create an account.

use std::{collections::HashSet, fmt::Debug};

use crate::auth::user::normalize_username;

/// Decides whether a username may register.
pub trait SignupPolicy: Debug + Send + Sync {
    /// Whether `username` may create an account.
    fn allows(&self, username: &str) -> bool;
}

/// Only the listed usernames may register. An empty list closes registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allowlist(HashSet<String>);

impl Allowlist {
    /// Create an allowlist, normalising each username the same way logins are.
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            usernames
                .into_iter()
                .map(|username| normalize_username(username.as_ref()))
                .filter(|username| !username.is_empty())
                .collect(),
        )
    }
}

impl SignupPolicy for Allowlist {
    fn allows(&self, username: &str) -> bool {
        self.0.contains(&normalize_username(username))
    }
}
