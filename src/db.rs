//! Database schema setup and connection helpers.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    auth::create_user_table,
    budget::create_budget_table,
    expense::create_expense_table,
    saving::create_saving_table,
    savings_goal::create_savings_goal_table,
    settings::create_settings_table,
};

/// Create the tables for all domain models if they do not exist yet.
///
/// Foreign key enforcement is switched on for the connection so that deleting
/// a user removes the rest of their data.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_settings_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_saving_table(&transaction)?;
    create_savings_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex has been poisoned.
pub(crate) fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}
