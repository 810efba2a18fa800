use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use time::OffsetDateTime;

use budget_tracker::{
    backup::{
        DEFAULT_BACKUPS_KEPT, auto_backup, backup_file_name, export_backup, import_backup,
        read_backup, write_backup,
    },
    initialize_db,
};

/// A utility for backing up and restoring the budget tracker database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export every user's data to a JSON file.
    Export {
        /// Where to write the backup. Defaults to a timestamped file in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore a backup for users that already have an account.
    Import {
        /// The backup file to restore.
        file: PathBuf,
    },
    /// Export into a directory and delete old automatic backups.
    Auto {
        /// The directory holding automatic backups.
        #[arg(short, long, default_value = "backups")]
        dir: PathBuf,

        /// How many automatic backups to keep.
        #[arg(short, long, default_value_t = DEFAULT_BACKUPS_KEPT)]
        keep: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    let now = OffsetDateTime::now_utc();

    match args.command {
        Command::Export { output } => {
            let path = match output {
                Some(path) => path,
                None => PathBuf::from(backup_file_name("backup_", now)?),
            };
            let backup = export_backup(&conn, now)?;
            write_backup(&backup, &path)?;

            println!("Backup created: {}", path.display());
            println!("  Users: {}", backup.users.len());
            println!("  Expenses: {}", backup.expenses.len());
            println!("  Budgets: {}", backup.budgets.len());
            println!("  Settings: {}", backup.settings.len());
            println!("  Savings: {}", backup.savings.len());
            println!("  Savings goals: {}", backup.savings_goals.len());
        }
        Command::Import { file } => {
            let backup = read_backup(&file)?;
            println!("Restoring from {} ({})", file.display(), backup.export_date);

            let summary = import_backup(&backup, &conn)?;

            for username in &summary.missing_users {
                println!("  Warning: user '{username}' not found, create the account first");
            }
            for (name, count) in [
                ("Expenses", summary.expenses),
                ("Budgets", summary.budgets),
                ("Settings", summary.settings),
                ("Savings", summary.savings),
                ("Savings goals", summary.savings_goals),
            ] {
                println!(
                    "  {name} restored: {} (skipped {})",
                    count.restored, count.skipped
                );
            }
        }
        Command::Auto { dir, keep } => {
            let path = auto_backup(&conn, &dir, now, keep)?;
            println!("Automatic backup created: {}", path.display());
        }
    }

    Ok(())
}
