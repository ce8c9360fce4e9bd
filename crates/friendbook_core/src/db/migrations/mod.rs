//! Schema revision registry and executor.
//!
//! # Responsibility
//! - Register schema revisions in strictly increasing order.
//! - Derive DDL from the difference between consecutive layouts.
//! - Apply pending revisions atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Each revision is a pure function from the previous layout to the next.
//! - Applied revision is mirrored to `PRAGMA user_version`.

mod layout;

pub use layout::{field_expr, index_name, CollectionLayout, SchemaLayout, BODY_COLUMN};

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Name of the single collection holding friend records.
pub const FRIENDS_COLLECTION: &str = "friends";

/// One step of schema evolution.
#[derive(Debug, Clone, Copy)]
pub struct Revision {
    pub version: u32,
    pub evolve: fn(SchemaLayout) -> DbResult<SchemaLayout>,
}

const REVISIONS: &[Revision] = &[
    Revision {
        version: 1,
        evolve: initial_friends,
    },
    Revision {
        version: 2,
        evolve: index_friend_city,
    },
];

fn initial_friends(layout: SchemaLayout) -> DbResult<SchemaLayout> {
    layout.with_collection(FRIENDS_COLLECTION, "++id,name,age")
}

fn index_friend_city(layout: SchemaLayout) -> DbResult<SchemaLayout> {
    layout.with_collection(FRIENDS_COLLECTION, "++id,name,age,city")
}

/// Returns every registered revision in application order.
pub fn revisions() -> &'static [Revision] {
    REVISIONS
}

/// Returns the latest revision version known by this binary.
pub fn latest_version() -> u32 {
    REVISIONS.last().map_or(0, |revision| revision.version)
}

/// Folds revisions up to and including `version` into a layout.
///
/// Version `0` is the empty store.
pub fn layout_at(version: u32) -> DbResult<SchemaLayout> {
    REVISIONS
        .iter()
        .take_while(|revision| revision.version <= version)
        .try_fold(SchemaLayout::empty(), |layout, revision| {
            (revision.evolve)(layout)
        })
}

/// Applies all pending revisions on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    migrate_to(conn, latest_version())
}

/// Applies pending revisions up to and including `target`.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the store or `target` is newer
///   than the latest known revision.
/// - `DbError::InvalidLayout` when a revision is not additive.
pub fn migrate_to(conn: &mut Connection, target: u32) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    for version in [current_version, target] {
        if version > latest {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: version,
                latest_supported: latest,
            });
        }
    }

    if current_version >= target {
        return Ok(());
    }

    let mut layout = layout_at(current_version)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for revision in REVISIONS {
        if revision.version <= current_version || revision.version > target {
            continue;
        }

        let next = (revision.evolve)(layout.clone())?;
        for statement in layout.statements_to(&next)? {
            tx.execute_batch(&statement)?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", revision.version))?;
        layout = next;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={current_version} to_version={target}");
    Ok(())
}

/// Reads the applied revision from `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
