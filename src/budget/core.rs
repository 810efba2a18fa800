//! Monthly budget limits per category and their database queries.

use std::collections::BTreeMap;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    money::{AmountInput, check_amount_limit, get_decimal},
};

/// The most a user plans to spend on a category in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// The spending category, e.g. "Groceries".
    pub category: String,
    /// The limit for a whole month. Never negative.
    pub monthly_limit: Decimal,
}

impl Budget {
    /// Create a budget, trimming the category name.
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the category is empty or the limit is negative
    /// or more than [MAX_AMOUNT](crate::money::MAX_AMOUNT).
    pub fn new(category: &str, monthly_limit: Decimal) -> Result<Self, Error> {
        let category = category.trim();

        if category.is_empty() {
            return Err(Error::InvalidArgument(
                "budget category cannot be empty".to_owned(),
            ));
        }

        if monthly_limit < Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "the budget for {category} cannot be negative, got {monthly_limit}"
            )));
        }

        Ok(Self {
            monthly_limit: check_amount_limit(
                monthly_limit,
                &format!("the budget for {category}"),
            )?,
            category: category.to_owned(),
        })
    }
}

/// Validate a `{category: limit}` map sent by a client.
///
/// # Errors
/// Returns [Error::InvalidArgument] if any entry is invalid, or two categories
/// are the same after trimming.
pub fn parse_budget_map(raw_budgets: &BTreeMap<String, AmountInput>) -> Result<Vec<Budget>, Error> {
    let mut budgets: Vec<Budget> = Vec::with_capacity(raw_budgets.len());

    for (category, raw_limit) in raw_budgets {
        let budget = Budget::new(category, raw_limit.to_decimal()?)?;

        if budgets.iter().any(|other| other.category == budget.category) {
            return Err(Error::InvalidArgument(format!(
                "the category {} appears more than once",
                budget.category
            )));
        }

        budgets.push(budget);
    }

    Ok(budgets)
}

/// Create the budget table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                monthly_limit TEXT NOT NULL,
                UNIQUE(user_id, category),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Get the budgets for `user_id` sorted by category.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT category, monthly_limit FROM budget WHERE user_id = ?1 ORDER BY category ASC",
        )?
        .query_map([user_id.as_i64()], map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Replace every budget belonging to `user_id` with `budgets` in a single transaction.
pub fn replace_budgets(
    user_id: UserID,
    budgets: &[Budget],
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute("DELETE FROM budget WHERE user_id = ?1", [user_id.as_i64()])?;

    for budget in budgets {
        upsert_budget(user_id, budget, &transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Insert a budget or overwrite the limit of the existing budget for the same category.
pub fn upsert_budget(user_id: UserID, budget: &Budget, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO budget (user_id, category, monthly_limit) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, category) DO UPDATE SET monthly_limit = excluded.monthly_limit",
        (
            user_id.as_i64(),
            &budget.category,
            budget.monthly_limit.to_string(),
        ),
    )?;

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        category: row.get(0)?,
        monthly_limit: get_decimal(row, 1)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        budget::{Budget, get_budgets, parse_budget_map, replace_budgets, upsert_budget},
        money::{AmountInput, MAX_AMOUNT},
        test_utils::{create_test_user, get_test_connection},
    };

    #[test]
    fn rejects_negative_limit() {
        assert!(matches!(
            Budget::new("Groceries", dec!(-1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_limit_over_the_maximum() {
        assert!(matches!(
            Budget::new("Gifts", Decimal::MAX),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            Budget::new("Gifts", MAX_AMOUNT).map(|budget| budget.monthly_limit),
            Ok(MAX_AMOUNT)
        );
    }

    #[test]
    fn rejects_blank_category() {
        assert!(matches!(
            Budget::new("  ", dec!(10)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_limit_is_allowed() {
        assert_eq!(
            Budget::new("Other", dec!(0)).map(|budget| budget.monthly_limit),
            Ok(dec!(0))
        );
    }

    #[test]
    fn parse_map_rejects_categories_that_collide_after_trimming() {
        let raw = BTreeMap::from([
            ("Food".to_owned(), AmountInput::from(dec!(10))),
            ("Food ".to_owned(), AmountInput::from(dec!(20))),
        ]);

        assert!(matches!(
            parse_budget_map(&raw),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn replace_removes_old_budgets() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);
        replace_budgets(
            user.id,
            &[
                Budget::new("Groceries", dec!(400)).unwrap(),
                Budget::new("Dining Out", dec!(150)).unwrap(),
            ],
            &connection,
        )
        .unwrap();

        replace_budgets(
            user.id,
            &[Budget::new("Utilities", dec!(120.50)).unwrap()],
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_budgets(user.id, &connection),
            Ok(vec![Budget::new("Utilities", dec!(120.50)).unwrap()])
        );
    }

    #[test]
    fn budgets_are_per_user() {
        let connection = get_test_connection();
        let cole = create_test_user("cole", &connection);
        let natalie = create_test_user("natalie", &connection);
        replace_budgets(
            cole.id,
            &[Budget::new("Groceries", dec!(400)).unwrap()],
            &connection,
        )
        .unwrap();

        replace_budgets(natalie.id, &[], &connection).unwrap();

        assert_eq!(get_budgets(cole.id, &connection).unwrap().len(), 1);
        assert_eq!(get_budgets(natalie.id, &connection), Ok(vec![]));
    }

    #[test]
    fn upsert_overwrites_existing_limit() {
        let connection = get_test_connection();
        let user = create_test_user("cole", &connection);
        upsert_budget(
            user.id,
            &Budget::new("Groceries", dec!(400)).unwrap(),
            &connection,
        )
        .unwrap();

        upsert_budget(
            user.id,
            &Budget::new("Groceries", dec!(450)).unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_budgets(user.id, &connection),
            Ok(vec![Budget::new("Groceries", dec!(450)).unwrap()])
        );
    }
}
