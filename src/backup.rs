//! Exporting every user's data to a JSON backup and restoring it.
//!
//! Password hashes are never exported, so a backup can only be restored into a
//! database where the users have already registered. Users are matched by
//! username and records of unmatched users are skipped.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, macros::format_description};

use crate::{
    Error,
    auth::{UserID, get_all_users, get_user_by_username},
    budget::{Budget, get_budgets, upsert_budget},
    expense::{Expense, NewExpense, create_expense, get_expenses},
    saving::{NewSaving, Saving, create_saving, get_savings},
    savings_goal::{NewSavingsGoal, SavingsGoal, get_savings_goals, insert_savings_goal},
    settings::{UserSettings, get_settings, save_settings},
};

/// How many automatic backups [auto_backup] keeps by default.
pub const DEFAULT_BACKUPS_KEPT: usize = 10;

const AUTO_BACKUP_PREFIX: &str = "auto_backup_";

/// A user as exported, without their password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupUser {
    /// The user's ID in the exporting database.
    pub id: i64,
    /// The username used to match users when restoring.
    pub username: String,
}

/// A record tagged with the ID of the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owned<T> {
    /// The owner's ID in the exporting database.
    pub user_id: i64,
    /// The record itself.
    #[serde(flatten)]
    pub record: T,
}

/// Every user's data at a point in time.
///
/// Amounts are written as JSON numbers, so only about 15 significant digits
/// survive a round trip. That covers every amount up to
/// [MAX_AMOUNT](crate::money::MAX_AMOUNT) to the cent, but an amount with
/// more digits than that comes back rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    /// When the backup was made.
    #[serde(with = "time::serde::rfc3339")]
    pub export_date: OffsetDateTime,
    /// The users who own the records below.
    pub users: Vec<BackupUser>,
    /// All expenses.
    pub expenses: Vec<Owned<Expense>>,
    /// All budgets.
    pub budgets: Vec<Owned<Budget>>,
    /// Settings for users who have changed them.
    pub settings: Vec<Owned<UserSettings>>,
    /// All one-off savings.
    #[serde(default)]
    pub savings: Vec<Owned<Saving>>,
    /// All savings goals, archived or not.
    #[serde(default)]
    pub savings_goals: Vec<Owned<SavingsGoal>>,
}

/// How many records of one kind were restored or skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreCount {
    /// Records written to the database.
    pub restored: usize,
    /// Records whose owner has no account in the database.
    pub skipped: usize,
}

impl RestoreCount {
    fn record(&mut self, restored: bool) {
        if restored {
            self.restored += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// What a restore did, per kind of record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    /// Usernames in the backup without an account in the database.
    pub missing_users: Vec<String>,
    /// Expense counts.
    pub expenses: RestoreCount,
    /// Budget counts.
    pub budgets: RestoreCount,
    /// Settings counts.
    pub settings: RestoreCount,
    /// Saving counts.
    pub savings: RestoreCount,
    /// Savings goal counts.
    pub savings_goals: RestoreCount,
}

/// Collect every user's data.
pub fn export_backup(connection: &Connection, now: OffsetDateTime) -> Result<Backup, Error> {
    let mut backup = Backup {
        export_date: now,
        users: Vec::new(),
        expenses: Vec::new(),
        budgets: Vec::new(),
        settings: Vec::new(),
        savings: Vec::new(),
        savings_goals: Vec::new(),
    };

    for user in get_all_users(connection)? {
        let user_id = user.id.as_i64();

        backup.users.push(BackupUser {
            id: user_id,
            username: user.username,
        });
        backup.expenses.extend(
            get_expenses(user.id, None, None, connection)?
                .into_iter()
                .map(|record| Owned { user_id, record }),
        );
        backup.budgets.extend(
            get_budgets(user.id, connection)?
                .into_iter()
                .map(|record| Owned { user_id, record }),
        );
        backup.savings.extend(
            get_savings(user.id, connection)?
                .into_iter()
                .map(|record| Owned { user_id, record }),
        );
        backup.savings_goals.extend(
            get_savings_goals(user.id, None, connection)?
                .into_iter()
                .map(|record| Owned { user_id, record }),
        );

        let settings = get_settings(user.id, connection)?;
        if settings != UserSettings::default() {
            backup.settings.push(Owned {
                user_id,
                record: settings,
            });
        }
    }

    Ok(backup)
}

/// Restore `backup` into the database in a single transaction.
///
/// Budgets overwrite existing budgets for the same category, settings
/// overwrite existing settings and everything else is added.
///
/// # Errors
/// Returns [Error::InvalidArgument] and restores nothing if any record fails
/// the checks applied to new records, e.g. an amount above the maximum.
pub fn import_backup(backup: &Backup, connection: &Connection) -> Result<RestoreSummary, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut summary = RestoreSummary::default();
    let mut user_ids: HashMap<i64, UserID> = HashMap::new();

    for user in &backup.users {
        match get_user_by_username(&user.username, &transaction) {
            Ok(existing) => {
                user_ids.insert(user.id, existing.id);
            }
            Err(Error::NotFound) => {
                tracing::warn!("user {} not found, skipping their records", user.username);
                summary.missing_users.push(user.username.clone());
            }
            Err(error) => return Err(error),
        }
    }

    for Owned { user_id, record } in &backup.expenses {
        let owner = user_ids.get(user_id);
        if let Some(&owner) = owner {
            let expense = NewExpense::new(
                record.date,
                &record.category,
                record.amount,
                &record.description,
            )?;
            create_expense(owner, &expense, &transaction)?;
        }
        summary.expenses.record(owner.is_some());
    }

    for Owned { user_id, record } in &backup.budgets {
        let owner = user_ids.get(user_id);
        if let Some(&owner) = owner {
            let budget = Budget::new(&record.category, record.monthly_limit)?;
            upsert_budget(owner, &budget, &transaction)?;
        }
        summary.budgets.record(owner.is_some());
    }

    for Owned { user_id, record } in &backup.settings {
        let owner = user_ids.get(user_id);
        if let Some(&owner) = owner {
            save_settings(owner, record, &transaction)?;
        }
        summary.settings.record(owner.is_some());
    }

    for Owned { user_id, record } in &backup.savings {
        let owner = user_ids.get(user_id);
        if let Some(&owner) = owner {
            let saving = NewSaving::new(record.date, record.amount, &record.description)?;
            create_saving(owner, &saving, &transaction)?;
        }
        summary.savings.record(owner.is_some());
    }

    for Owned { user_id, record } in &backup.savings_goals {
        let owner = user_ids.get(user_id);
        if let Some(&owner) = owner {
            NewSavingsGoal::new(&record.name, record.target_amount)?;
            insert_savings_goal(owner, record, &transaction)?;
        }
        summary.savings_goals.record(owner.is_some());
    }

    transaction.commit()?;

    Ok(summary)
}

/// Write `backup` to `path` as pretty printed JSON.
pub fn write_backup(backup: &Backup, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(backup)
        .map_err(|error| Error::BackupFileError(error.to_string()))?;

    fs::write(path, json)
        .map_err(|error| Error::BackupFileError(format!("could not write {path:?}: {error}")))
}

/// Read a backup written by [write_backup].
pub fn read_backup(path: &Path) -> Result<Backup, Error> {
    let json = fs::read_to_string(path)
        .map_err(|error| Error::BackupFileError(format!("could not read {path:?}: {error}")))?;

    serde_json::from_str(&json)
        .map_err(|error| Error::BackupFileError(format!("invalid backup {path:?}: {error}")))
}

/// The file name for a backup made at `now`, e.g. `backup_20240215_093000.json`.
pub fn backup_file_name(prefix: &str, now: OffsetDateTime) -> Result<String, Error> {
    let timestamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .map_err(|error| Error::BackupFileError(format!("could not name backup: {error}")))?;

    Ok(format!("{prefix}{timestamp}.json"))
}

/// Export the database into `directory` and delete all but the newest `keep`
/// automatic backups there.
///
/// Returns the path of the new backup.
pub fn auto_backup(
    connection: &Connection,
    directory: &Path,
    now: OffsetDateTime,
    keep: usize,
) -> Result<PathBuf, Error> {
    fs::create_dir_all(directory).map_err(|error| {
        Error::BackupFileError(format!("could not create {directory:?}: {error}"))
    })?;

    let path = directory.join(backup_file_name(AUTO_BACKUP_PREFIX, now)?);
    write_backup(&export_backup(connection, now)?, &path)?;
    tracing::info!("created automatic backup {path:?}");

    for old_backup in prune_backups(directory, keep)? {
        tracing::info!("removed old backup {old_backup:?}");
    }

    Ok(path)
}

/// Delete all but the newest `keep` automatic backups in `directory`.
///
/// Backup names embed their timestamp, so the newest sort last.
fn prune_backups(directory: &Path, keep: usize) -> Result<Vec<PathBuf>, Error> {
    let read_error =
        |error: std::io::Error| Error::BackupFileError(format!("could not read {directory:?}: {error}"));

    let mut backups: Vec<PathBuf> = fs::read_dir(directory)
        .map_err(read_error)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(AUTO_BACKUP_PREFIX) && name.ends_with(".json"))
        })
        .collect();

    backups.sort_unstable_by(|a, b| b.cmp(a));

    let mut removed = Vec::new();
    for old_backup in backups.into_iter().skip(keep) {
        fs::remove_file(&old_backup).map_err(|error| {
            Error::BackupFileError(format!("could not remove {old_backup:?}: {error}"))
        })?;
        removed.push(old_backup);
    }

    Ok(removed)
}
