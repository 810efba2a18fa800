//! Defines the expense model and its database queries.

use std::collections::BTreeMap;

use rusqlite::{Connection, Row, named_params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    calendar::{DateRange, YearMonth, iso_date},
    database_id::DatabaseId,
    money::{add_amounts, check_amount_limit, get_decimal},
};

/// Money spent on a single day in a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: DatabaseId,
    /// The day the money was spent.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The spending category, e.g. "Groceries".
    pub category: String,
    /// How much was spent. Always positive.
    pub amount: Decimal,
    /// A free text note.
    pub description: String,
}

/// A validated expense that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    date: Date,
    category: String,
    amount: Decimal,
    description: String,
}

impl NewExpense {
    /// Validate the fields of a new expense.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the category is blank or the amount is not
    /// positive or more than [MAX_AMOUNT](crate::money::MAX_AMOUNT).
    pub fn new(
        date: Date,
        category: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<Self, Error> {
        let category = category.trim();

        if category.is_empty() {
            return Err(Error::InvalidArgument(
                "expense category cannot be empty".to_owned(),
            ));
        }

        if amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "expense amount must be greater than zero, got {amount}"
            )));
        }

        Ok(Self {
            date,
            category: category.to_owned(),
            amount: check_amount_limit(amount, "expense amount")?,
            description: description.trim().to_owned(),
        })
    }
}

/// The total and number of expenses in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpending {
    /// The spending category.
    pub category: String,
    /// The sum of the expense amounts.
    pub total: Decimal,
    /// How many expenses were summed.
    pub count: u32,
}

/// Create the expense table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Save `expense` for `user_id`.
pub fn create_expense(
    user_id: UserID,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection.execute(
        "INSERT INTO expense (user_id, date, category, amount, description)
            VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            user_id.as_i64(),
            expense.date,
            &expense.category,
            expense.amount.to_string(),
            &expense.description,
        ),
    )?;

    Ok(Expense {
        id: connection.last_insert_rowid(),
        date: expense.date,
        category: expense.category.clone(),
        amount: expense.amount,
        description: expense.description.clone(),
    })
}

/// Get the expenses of `user_id` dated between `start` and `end`, both inclusive and optional.
///
/// Newest expenses come first.
pub fn get_expenses(
    user_id: UserID,
    start: Option<Date>,
    end: Option<Date>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, date, category, amount, description FROM expense
                WHERE user_id = :user_id
                AND (:start IS NULL OR date >= :start)
                AND (:end IS NULL OR date <= :end)
                ORDER BY date DESC, id DESC",
        )?
        .query_map(
            named_params! { ":user_id": user_id.as_i64(), ":start": start, ":end": end },
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Delete the expense `id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such expense or it belongs to someone else.
pub fn delete_expense(user_id: UserID, id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Sum the expenses in the half-open `range` by category, sorted by category.
pub fn sum_expenses_by_category(
    user_id: UserID,
    range: &DateRange,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    sum_by_category(user_id, Some(range.start), Some(range.end), connection)
}

/// Sum the expenses between the optional, inclusive `start` and `end` dates by category.
pub fn sum_expenses_by_category_between(
    user_id: UserID,
    start: Option<Date>,
    end: Option<Date>,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    let end_exclusive = end.and_then(|end| end.next_day());

    sum_by_category(user_id, start, end_exclusive, connection)
}

fn sum_by_category(
    user_id: UserID,
    start: Option<Date>,
    end_exclusive: Option<Date>,
    connection: &Connection,
) -> Result<Vec<CategorySpending>, Error> {
    let mut statement = connection.prepare(
        "SELECT category, amount FROM expense
            WHERE user_id = :user_id
            AND (:start IS NULL OR date >= :start)
            AND (:end IS NULL OR date < :end)",
    )?;
    let rows = statement.query_map(
        named_params! { ":user_id": user_id.as_i64(), ":start": start, ":end": end_exclusive },
        |row| Ok((row.get::<_, String>(0)?, get_decimal(row, 1)?)),
    )?;

    let mut totals: BTreeMap<String, (Decimal, u32)> = BTreeMap::new();
    for row in rows {
        let (category, amount) = row?;
        let entry = totals.entry(category).or_insert((Decimal::ZERO, 0));
        entry.0 = add_amounts(entry.0, amount)?;
        entry.1 += 1;
    }

    Ok(totals
        .into_iter()
        .map(|(category, (total, count))| CategorySpending {
            category,
            total,
            count,
        })
        .collect())
}

/// Sum the expenses from `since` onwards by calendar month, oldest month first.
pub fn sum_expenses_by_month(
    user_id: UserID,
    since: Date,
    connection: &Connection,
) -> Result<Vec<(YearMonth, Decimal)>, Error> {
    let mut statement = connection
        .prepare("SELECT date, amount FROM expense WHERE user_id = ?1 AND date >= ?2")?;
    let rows = statement.query_map((user_id.as_i64(), since), |row| {
        Ok((row.get::<_, Date>(0)?, get_decimal(row, 1)?))
    })?;

    let mut totals: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for row in rows {
        let (date, amount) = row?;
        let total = totals.entry(YearMonth::of(date)).or_insert(Decimal::ZERO);
        *total = add_amounts(*total, amount)?;
    }

    Ok(totals.into_iter().collect())
}

/// The distinct months in which `user_id` has at least one expense, oldest first.
pub fn get_expense_months(user_id: UserID, connection: &Connection) -> Result<Vec<YearMonth>, Error> {
    let tokens = connection
        .prepare(
            "SELECT DISTINCT substr(date, 1, 7) AS month FROM expense
                WHERE user_id = ?1 ORDER BY month ASC",
        )?
        .query_map([user_id.as_i64()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    tokens.iter().map(|token| token.parse()).collect()
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        category: row.get(2)?,
        amount: get_decimal(row, 3)?,
        description: row.get(4)?,
    })
}
