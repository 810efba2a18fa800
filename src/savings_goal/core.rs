//! Savings goals: a named target amount that money is added to over time.

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    money::{add_amounts, check_amount_limit, get_decimal, percentage_of, round_percentage},
};

/// A target amount a user is saving towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: DatabaseId,
    /// What the user is saving for.
    pub name: String,
    /// How much the user wants to save.
    pub target_amount: Decimal,
    /// How much has been added so far.
    pub current_amount: Decimal,
    /// Archived goals are hidden from the active list and cannot receive money.
    pub archived: bool,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the target was reached or the goal was archived.
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl SavingsGoal {
    /// How far along the goal is as a percentage rounded to one decimal place, capped at 100.
    pub fn progress_percentage(&self) -> Decimal {
        // Only an amount far past the target can overflow.
        percentage_of(self.current_amount, self.target_amount)
            .map_or(Decimal::ONE_HUNDRED, round_percentage)
            .min(Decimal::ONE_HUNDRED)
    }

    /// Whether the amount saved has reached the target.
    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// A validated goal that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsGoal {
    name: String,
    target_amount: Decimal,
}

impl NewSavingsGoal {
    /// Validate the name and target of a new goal.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the name is blank or the target is not
    /// positive or more than [MAX_AMOUNT](crate::money::MAX_AMOUNT).
    pub fn new(name: &str, target_amount: Decimal) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "savings goal name cannot be empty".to_owned(),
            ));
        }

        if target_amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "savings goal target must be greater than zero, got {target_amount}"
            )));
        }

        Ok(Self {
            name: name.to_owned(),
            target_amount: check_amount_limit(target_amount, "savings goal target")?,
        })
    }
}

/// Create the savings goal table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                current_amount TEXT NOT NULL,
                archived INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Store a new goal with nothing saved yet.
pub fn create_savings_goal(
    user_id: UserID,
    goal: &NewSavingsGoal,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    insert_savings_goal(
        user_id,
        &SavingsGoal {
            id: 0,
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            current_amount: Decimal::ZERO,
            archived: false,
            created_at: now,
            completed_at: None,
        },
        connection,
    )
}

/// Store `goal` as is, ignoring its ID. Used when restoring backups.
pub fn insert_savings_goal(
    user_id: UserID,
    goal: &SavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection.execute(
        "INSERT INTO savings_goal
            (user_id, name, target_amount, current_amount, archived, created_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            &goal.name,
            goal.target_amount.to_string(),
            goal.current_amount.to_string(),
            goal.archived,
            goal.created_at,
            goal.completed_at,
        ),
    )?;

    Ok(SavingsGoal {
        id: connection.last_insert_rowid(),
        ..goal.clone()
    })
}

/// Get the goals of `user_id`, newest first, optionally only archived or only active ones.
pub fn get_savings_goals(
    user_id: UserID,
    archived: Option<bool>,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(
            "SELECT id, name, target_amount, current_amount, archived, created_at, completed_at
                FROM savings_goal
                WHERE user_id = :user_id AND (:archived IS NULL OR archived = :archived)
                ORDER BY created_at DESC, id DESC",
        )?
        .query_map(
            named_params! { ":user_id": user_id.as_i64(), ":archived": archived },
            map_goal_row,
        )?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Get a single goal belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such goal or it belongs to someone else.
pub fn get_savings_goal(
    user_id: UserID,
    id: DatabaseId,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .query_row(
            "SELECT id, name, target_amount, current_amount, archived, created_at, completed_at
                FROM savings_goal WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
            map_goal_row,
        )
        .optional()?
        .ok_or(Error::NotFound)
}

/// Add `amount` to a goal. Reaching the target completes and archives the goal.
///
/// Returns the updated goal and whether this addition completed it.
///
/// # Errors
/// Returns:
/// - [Error::InvalidArgument] if `amount` is not positive or more than
///   [MAX_AMOUNT](crate::money::MAX_AMOUNT),
/// - [Error::NotFound] if the goal does not exist or belongs to someone else,
/// - [Error::GoalArchived] if the goal has been archived.
pub fn add_to_savings_goal(
    user_id: UserID,
    id: DatabaseId,
    amount: Decimal,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(SavingsGoal, bool), Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidArgument(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    check_amount_limit(amount, "amount")?;

    let mut goal = get_savings_goal(user_id, id, connection)?;

    if goal.archived {
        return Err(Error::GoalArchived);
    }

    goal.current_amount = add_amounts(goal.current_amount, amount)?;
    let completed = goal.is_reached();

    if completed {
        goal.archived = true;
        goal.completed_at = Some(now);
    }

    connection.execute(
        "UPDATE savings_goal SET current_amount = ?1, archived = ?2, completed_at = ?3
            WHERE id = ?4 AND user_id = ?5",
        (
            goal.current_amount.to_string(),
            goal.archived,
            goal.completed_at,
            id,
            user_id.as_i64(),
        ),
    )?;

    Ok((goal, completed))
}

/// Archive a goal, recording `now` as the completion time unless it is already set.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such goal or it belongs to someone else.
pub fn archive_savings_goal(
    user_id: UserID,
    id: DatabaseId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let rows_affected = connection.execute(
        "UPDATE savings_goal SET archived = 1, completed_at = COALESCE(completed_at, ?1)
            WHERE id = ?2 AND user_id = ?3",
        (now, id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_savings_goal(user_id, id, connection)
}

/// Delete a goal.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such goal or it belongs to someone else.
pub fn delete_savings_goal(
    user_id: UserID,
    id: DatabaseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: get_decimal(row, 2)?,
        current_amount: get_decimal(row, 3)?,
        archived: row.get(4)?,
        created_at: row.get(5)?,
        completed_at: row.get(6)?,
    })
}
