//! Scripted demo sequence and its human-readable output log.
//!
//! # Responsibility
//! - Run the fixed CRUD/query/transaction walkthrough against the service.
//! - Collect one log line per step plus at most one error message.
//!
//! # Invariants
//! - The first failing step aborts the rest of the sequence.
//! - A failure is surfaced once, as `DemoLog::error`; no step is retried.

use crate::model::friend::{FriendChanges, NewFriend};
use crate::repo::friend_repo::{FriendRepository, RepoResult};
use crate::service::friend_service::FriendService;
use log::{info, warn};
use std::fmt::Display;

/// Display name of the demo store.
pub const DATABASE_NAME: &str = "MyBlogDemoDatabase";
/// Default file the CLI opens when no path is given.
pub const DATABASE_FILE_NAME: &str = "MyBlogDemoDatabase.sqlite3";

/// Ordered output lines plus an optional single error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoLog {
    lines: Vec<String>,
    error: Option<String>,
}

impl DemoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Clears both lines and the error message.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.error = None;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

/// Logs that the store handle is ready.
pub fn report_store_opened(log: &mut DemoLog) {
    log.push(format!("Database '{DATABASE_NAME}' opened."));
}

/// Records a store open failure as the demo error.
pub fn report_store_open_failed(log: &mut DemoLog, err: &dyn Display) {
    log.set_error(format!("DB init failed: {err}"));
}

/// Runs the full walkthrough, replacing whatever `log` held before.
///
/// Returns `true` when every step succeeded.
pub fn run_all_examples<R: FriendRepository>(
    service: &mut FriendService<R>,
    log: &mut DemoLog,
) -> bool {
    log.clear();
    log.push("--- Running All Friendbook Examples ---");

    match run_steps(service, log) {
        Ok(()) => {
            log.push("--- All Friendbook Examples Finished ---");
            info!(
                "event=demo_run module=demo status=ok steps={}",
                log.lines().len()
            );
            true
        }
        Err(err) => {
            warn!("event=demo_run module=demo status=error error={err}");
            log.set_error(format!("An error occurred: {err}"));
            false
        }
    }
}

/// Removes every record from the collection.
pub fn clear_db_data<R: FriendRepository>(service: &FriendService<R>, log: &mut DemoLog) -> bool {
    match service.clear_friends() {
        Ok(removed) => {
            info!("event=demo_clear module=demo status=ok removed={removed}");
            log.push("Database data cleared!");
            true
        }
        Err(err) => {
            warn!("event=demo_clear module=demo status=error error={err}");
            log.set_error(format!("An error occurred: {err}"));
            false
        }
    }
}

fn run_steps<R: FriendRepository>(
    service: &mut FriendService<R>,
    log: &mut DemoLog,
) -> RepoResult<()> {
    service.clear_friends()?;
    log.push("Database cleared for fresh demo.");

    let first_id = service.create_friend(&NewFriend::new("John Doe", 30))?;
    log.push(format!("Added John Doe with ID: {first_id}"));
    let second_id = service.create_friend(&NewFriend::new("Jane Smith", 25))?;
    log.push(format!("Added Jane Smith with ID: {second_id}"));
    service.create_friend(&NewFriend::new("Peter Jones", 40))?;
    log.push("Added Peter Jones");
    service.create_friend(&NewFriend::new("John Doe", 18).with_city("Austin"))?;
    log.push("Added John Doe (Austin)");

    let first = service.get_friend(first_id)?;
    log.push(format!(
        "Read Friend (ID {first_id}): {}",
        serde_json::to_string(&first)?
    ));

    let updated = service.update_friend(first_id, &FriendChanges::age(31))?;
    let outcome = if updated == 1 { "Success" } else { "Fail" };
    log.push(format!("Updated Friend (ID {first_id}, age 31): {outcome}"));

    let older = service.friends_older_than_20()?;
    log.push(format!(
        "Friends older than 20: {}",
        serde_json::to_string(&older)?
    ));

    let john_does = service.john_does()?;
    log.push(format!(
        "All \"John Doe\"s: {}",
        serde_json::to_string(&john_does)?
    ));

    let john_does_over_20 = service.john_does_over_20()?;
    log.push(format!(
        "\"John Doe\"s over 20: {}",
        serde_json::to_string(&john_does_over_20)?
    ));

    service.perform_transaction()?;
    log.push("Transaction example finished.");

    service.delete_friend(second_id)?;
    log.push(format!("Deleted friend with ID {second_id}."));

    Ok(())
}
