//! Command-line front end for the Friendbook demo.
//!
//! # Responsibility
//! - Open the store, run one demo action and print the resulting log.
//! - Close the store handle explicitly before exiting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use friendbook_core::db::{close_db, open_db, open_db_in_memory};
use friendbook_core::demo::{report_store_open_failed, report_store_opened, DATABASE_FILE_NAME};
use friendbook_core::{
    clear_db_data, default_log_level, init_logging, run_all_examples, DemoLog, FriendService,
    SqliteFriendRepository,
};
use log::info;
use std::path::PathBuf;

const IN_MEMORY_PATH: &str = ":memory:";

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Friends collection demo on an embedded document store", long_about = None)]
struct Cli {
    /// Database file, or `:memory:` for a throwaway store
    #[arg(long, global = true, default_value = DATABASE_FILE_NAME)]
    db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full create/read/update/query/transaction/delete walkthrough
    Demo,

    /// Remove every record from the friends collection
    Clear,

    /// Print every stored record as JSON
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let mut log = DemoLog::new();
    let opened = if cli.db == IN_MEMORY_PATH {
        open_db_in_memory()
    } else {
        open_db(&cli.db)
    };
    let mut conn = match opened {
        Ok(conn) => {
            report_store_opened(&mut log);
            conn
        }
        Err(err) => {
            report_store_open_failed(&mut log, &err);
            print_log(&log);
            bail!("could not open `{}`", cli.db);
        }
    };

    let succeeded = {
        let repo = SqliteFriendRepository::try_new(&mut conn)?;
        let mut service = FriendService::new(repo);
        match cli.command {
            Commands::Demo => run_all_examples(&mut service, &mut log),
            Commands::Clear => clear_db_data(&service, &mut log),
            Commands::List => {
                for friend in service.list_friends()? {
                    log.push(serde_json::to_string(&friend)?);
                }
                true
            }
        }
    };

    print_log(&log);
    close_db(conn).context("failed to close database")?;
    info!("event=cli_exit module=cli status={}", if succeeded { "ok" } else { "error" });

    if !succeeded {
        bail!("demo action failed");
    }
    Ok(())
}

fn print_log(log: &DemoLog) {
    for line in log.lines() {
        println!("{line}");
    }
    if let Some(error) = log.error() {
        eprintln!("{error}");
    }
}
