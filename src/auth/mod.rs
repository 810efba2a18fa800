//! User accounts, password handling and cookie based sessions.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod policy;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{LogInData, LoginState, get_me, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use policy::{Allowlist, SignupPolicy};
pub use register::{RegisterForm, RegistrationState, register_user};
pub use user::{
    User, UserID, create_user, create_user_table, get_all_users, get_user_by_id,
    get_user_by_username,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
