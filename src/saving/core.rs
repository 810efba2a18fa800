//! Defines the one-off saving model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::{DateRange, iso_date},
    database_id::DatabaseId,
    money::{add_amounts, check_amount_limit, get_decimal},
};

/// Money put aside on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saving {
    /// The ID of the saving.
    pub id: DatabaseId,
    /// The day the money was saved.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// How much was saved. Always positive.
    pub amount: Decimal,
    /// A free text note.
    pub description: String,
}

/// A validated saving that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSaving {
    date: Date,
    amount: Decimal,
    description: String,
}

impl NewSaving {
    /// Validate the fields of a new saving.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the amount is not positive or more than
    /// [MAX_AMOUNT](crate::money::MAX_AMOUNT).
    pub fn new(date: Date, amount: Decimal, description: &str) -> Result<Self, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "saving amount must be greater than zero, got {amount}"
            )));
        }

        Ok(Self {
            date,
            amount: check_amount_limit(amount, "saving amount")?,
            description: description.trim().to_owned(),
        })
    }
}

/// Create the saving table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_saving_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS saving (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Save `saving` for `user_id`.
pub fn create_saving(
    user_id: UserID,
    saving: &NewSaving,
    connection: &Connection,
) -> Result<Saving, Error> {
    connection.execute(
        "INSERT INTO saving (user_id, date, amount, description) VALUES (?1, ?2, ?3, ?4)",
        (
            user_id.as_i64(),
            saving.date,
            saving.amount.to_string(),
            &saving.description,
        ),
    )?;

    Ok(Saving {
        id: connection.last_insert_rowid(),
        date: saving.date,
        amount: saving.amount,
        description: saving.description.clone(),
    })
}

/// Get every saving of `user_id`, newest first.
pub fn get_savings(user_id: UserID, connection: &Connection) -> Result<Vec<Saving>, Error> {
    connection
        .prepare(
            "SELECT id, date, amount, description FROM saving
                WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_saving_row)?
        .map(|maybe_saving| maybe_saving.map_err(Error::from))
        .collect()
}

/// Delete the saving `id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such saving or it belongs to someone else.
pub fn delete_saving(user_id: UserID, id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM saving WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// The total saved by `user_id` within the half-open `range`, zero if nothing was saved.
pub fn sum_savings(user_id: UserID, range: &DateRange, connection: &Connection) -> Result<Decimal, Error> {
    let mut statement = connection
        .prepare("SELECT amount FROM saving WHERE user_id = ?1 AND date >= ?2 AND date < ?3")?;
    let amounts = statement.query_map((user_id.as_i64(), range.start, range.end), |row| {
        get_decimal(row, 0)
    })?;

    let mut total = Decimal::ZERO;
    for amount in amounts {
        total = add_amounts(total, amount?)?;
    }

    Ok(total)
}

fn map_saving_row(row: &Row) -> Result<Saving, rusqlite::Error> {
    Ok(Saving {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: get_decimal(row, 2)?,
        description: row.get(3)?,
    })
}
