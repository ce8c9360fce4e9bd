//! Friend repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and indexed query APIs over the `friends` collection.
//! - Keep SQL and JSON document details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate record shape before SQL mutations.
//! - Missing identifiers are not errors: reads return `None`, updates
//!   return `0`, deletes are no-ops.
//! - Multi-record inserts commit all records or none.
//! - Query filters use the exact index expressions declared by the schema
//!   revisions so SQLite serves them from the expression indexes.

use crate::db::migrations::FRIENDS_COLLECTION;
use crate::db::DbError;
use crate::model::friend::{Friend, FriendChanges, FriendId, FriendValidationError, NewFriend};
use log::{debug, warn};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FRIEND_SELECT_SQL: &str = "SELECT id, body FROM friends";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for friend persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(FriendValidationError),
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to encode friend record: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted friend data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "store is not migrated: missing table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<FriendValidationError> for RepoError {
    fn from(value: FriendValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Repository interface for the friends collection.
pub trait FriendRepository {
    /// Inserts one record and returns the store-assigned identifier.
    fn create_friend(&self, friend: &NewFriend) -> RepoResult<FriendId>;
    /// Reads one record; `None` when the identifier is unknown.
    fn get_friend(&self, id: FriendId) -> RepoResult<Option<Friend>>;
    /// Applies a partial update and returns the number of updated records.
    fn update_friend(&self, id: FriendId, changes: &FriendChanges) -> RepoResult<usize>;
    /// Removes one record if present.
    fn delete_friend(&self, id: FriendId) -> RepoResult<()>;
    /// Every record in identifier order.
    fn list_friends(&self) -> RepoResult<Vec<Friend>>;
    /// Records with `age > threshold`, in age index order.
    fn friends_older_than(&self, threshold: i64) -> RepoResult<Vec<Friend>>;
    /// Records whose name equals `name` exactly, in identifier order.
    fn friends_named(&self, name: &str) -> RepoResult<Vec<Friend>>;
    /// Age range scan filtered in memory by exact name.
    fn friends_named_older_than(&self, name: &str, threshold: i64) -> RepoResult<Vec<Friend>>;
    /// Inserts all records in one transaction; nothing is kept on failure.
    fn insert_friends(&mut self, friends: &[NewFriend]) -> RepoResult<Vec<FriendId>>;
    /// Removes every record and returns how many were removed.
    fn clear_friends(&self) -> RepoResult<usize>;
    /// Number of stored records.
    fn count_friends(&self) -> RepoResult<u64>;
}

/// SQLite-backed friend repository.
pub struct SqliteFriendRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteFriendRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `RepoError::MissingRequiredTable` when revisions were not applied.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        if !table_exists(conn, FRIENDS_COLLECTION)? {
            return Err(RepoError::MissingRequiredTable(FRIENDS_COLLECTION));
        }
        Ok(Self { conn })
    }
}

impl FriendRepository for SqliteFriendRepository<'_> {
    fn create_friend(&self, friend: &NewFriend) -> RepoResult<FriendId> {
        let id = insert_friend(self.conn, friend)?;
        debug!("event=friend_create module=repo status=ok id={id}");
        Ok(id)
    }

    fn get_friend(&self, id: FriendId) -> RepoResult<Option<Friend>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FRIEND_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_friend_row(row)?));
        }

        Ok(None)
    }

    fn update_friend(&self, id: FriendId, changes: &FriendChanges) -> RepoResult<usize> {
        changes.validate()?;

        let patch = serde_json::to_string(&changes_to_patch(changes))?;
        let changed = self.conn.execute(
            "UPDATE friends SET body = json_patch(body, ?2) WHERE id = ?1;",
            params![id, patch],
        )?;

        debug!("event=friend_update module=repo status=ok id={id} changed={changed}");
        Ok(changed)
    }

    fn delete_friend(&self, id: FriendId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM friends WHERE id = ?1;", [id])?;
        debug!("event=friend_delete module=repo status=ok id={id} changed={changed}");
        Ok(())
    }

    fn list_friends(&self) -> RepoResult<Vec<Friend>> {
        query_friends(
            self.conn,
            &format!("{FRIEND_SELECT_SQL} ORDER BY id ASC;"),
            [],
        )
    }

    fn friends_older_than(&self, threshold: i64) -> RepoResult<Vec<Friend>> {
        query_friends(
            self.conn,
            &format!(
                "{FRIEND_SELECT_SQL}
                 WHERE json_extract(body, '$.age') > ?1
                 ORDER BY json_extract(body, '$.age') ASC, id ASC;"
            ),
            params![threshold],
        )
    }

    fn friends_named(&self, name: &str) -> RepoResult<Vec<Friend>> {
        query_friends(
            self.conn,
            &format!(
                "{FRIEND_SELECT_SQL}
                 WHERE json_extract(body, '$.name') = ?1
                 ORDER BY id ASC;"
            ),
            params![name],
        )
    }

    fn friends_named_older_than(&self, name: &str, threshold: i64) -> RepoResult<Vec<Friend>> {
        let mut friends = self.friends_older_than(threshold)?;
        friends.retain(|friend| friend.name == name);
        Ok(friends)
    }

    fn insert_friends(&mut self, friends: &[NewFriend]) -> RepoResult<Vec<FriendId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut ids = Vec::with_capacity(friends.len());
        for friend in friends {
            match insert_friend(&tx, friend) {
                Ok(id) => ids.push(id),
                Err(err) => {
                    // Dropping `tx` rolls back the records inserted so far.
                    warn!(
                        "event=friend_insert_batch module=repo status=rolled_back attempted={} error={}",
                        friends.len(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        tx.commit()?;
        debug!(
            "event=friend_insert_batch module=repo status=ok inserted={}",
            ids.len()
        );
        Ok(ids)
    }

    fn clear_friends(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM friends;", [])?;
        debug!("event=friend_clear module=repo status=ok removed={removed}");
        Ok(removed)
    }

    fn count_friends(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM friends;", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert_friend(conn: &Connection, friend: &NewFriend) -> RepoResult<FriendId> {
    friend.validate()?;

    let body = serde_json::to_string(friend)?;
    conn.execute("INSERT INTO friends (body) VALUES (?1);", [body])?;
    Ok(conn.last_insert_rowid())
}

fn query_friends(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Vec<Friend>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut friends = Vec::new();

    while let Some(row) = rows.next()? {
        friends.push(parse_friend_row(row)?);
    }

    Ok(friends)
}

fn parse_friend_row(row: &Row<'_>) -> RepoResult<Friend> {
    let id: FriendId = row.get("id")?;
    let body: String = row.get("body")?;

    let record: NewFriend = serde_json::from_str(&body).map_err(|err| {
        RepoError::InvalidData(format!("undecodable body for friends.id={id}: {err}"))
    })?;
    record.validate().map_err(|err| {
        RepoError::InvalidData(format!("invalid record for friends.id={id}: {err}"))
    })?;

    Ok(record.into_friend(id))
}

/// Builds a JSON merge patch. A `null` member removes the key.
fn changes_to_patch(changes: &FriendChanges) -> Value {
    let mut patch = Map::new();
    if let Some(name) = &changes.name {
        patch.insert("name".to_string(), Value::from(name.as_str()));
    }
    if let Some(age) = changes.age {
        patch.insert("age".to_string(), Value::from(age));
    }
    if let Some(city) = &changes.city {
        let value = city.as_deref().map_or(Value::Null, Value::from);
        patch.insert("city".to_string(), value);
    }
    Value::Object(patch)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
