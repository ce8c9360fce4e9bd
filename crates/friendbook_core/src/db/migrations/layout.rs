//! Declarative collection layouts and the DDL needed to move between them.
//!
//! A layout describes each collection by a compact schema string such as
//! `"++id,name,age"`: the first entry is the primary key (`++` marks an
//! auto-incremented key) and the remaining entries are indexed fields.
//!
//! # Invariants
//! - Records live in a single JSON `body` column; indexes are expression
//!   indexes over `json_extract(body, '$.<field>')`.
//! - Layout transitions are additive for collections and primary keys.
//!   Indexed fields may be added or dropped.

use crate::db::{DbError, DbResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Column holding the JSON document of each record.
pub const BODY_COLUMN: &str = "body";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Shape of one collection: its primary key and indexed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLayout {
    primary_key: &'static str,
    auto_increment: bool,
    indexes: BTreeSet<&'static str>,
}

impl CollectionLayout {
    /// Parses a schema string like `"++id,name,age,city"`.
    ///
    /// # Errors
    /// - Returns `DbError::InvalidLayout` for empty entries, invalid field
    ///   names or fields listed twice.
    pub fn parse(schema: &'static str) -> DbResult<Self> {
        let mut entries = schema.split(',').map(str::trim);

        let key_entry = entries.next().unwrap_or_default();
        let (primary_key, auto_increment) = match key_entry.strip_prefix("++") {
            Some(key) => (key, true),
            None => (key_entry, false),
        };
        validate_identifier(primary_key, schema)?;

        let mut indexes = BTreeSet::new();
        for field in entries {
            validate_identifier(field, schema)?;
            if field == primary_key || !indexes.insert(field) {
                return Err(DbError::InvalidLayout(format!(
                    "field `{field}` listed twice in `{schema}`"
                )));
            }
        }

        Ok(Self {
            primary_key,
            auto_increment,
            indexes,
        })
    }

    pub fn primary_key(&self) -> &'static str {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Indexed fields in name order. The primary key is not included.
    pub fn indexes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.indexes.iter().copied()
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexes.contains(field)
    }
}

/// Every collection known at one schema revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaLayout {
    collections: BTreeMap<&'static str, CollectionLayout>,
}

impl SchemaLayout {
    /// Returns the layout of a store with no collections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy of this layout where `name` has the given schema.
    ///
    /// Declaring an existing collection again replaces its definition.
    pub fn with_collection(mut self, name: &'static str, schema: &'static str) -> DbResult<Self> {
        validate_identifier(name, name)?;
        let collection = CollectionLayout::parse(schema)?;
        self.collections.insert(name, collection);
        Ok(self)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionLayout> {
        self.collections.get(name)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collections.keys().copied()
    }

    /// Computes the DDL statements that turn `self` into `next`.
    ///
    /// # Errors
    /// - Removing a collection or changing its primary key is rejected with
    ///   `DbError::InvalidLayout`.
    pub fn statements_to(&self, next: &SchemaLayout) -> DbResult<Vec<String>> {
        if let Some(name) = self
            .collections
            .keys()
            .find(|name| !next.collections.contains_key(*name))
        {
            return Err(DbError::InvalidLayout(format!(
                "collection `{name}` cannot be removed"
            )));
        }

        let mut statements = Vec::new();
        for (name, target) in &next.collections {
            match self.collections.get(name) {
                None => {
                    statements.push(create_table_sql(name, target));
                    statements.extend(target.indexes().map(|field| create_index_sql(name, field)));
                }
                Some(current) => {
                    if current.primary_key != target.primary_key
                        || current.auto_increment != target.auto_increment
                    {
                        return Err(DbError::InvalidLayout(format!(
                            "primary key of collection `{name}` cannot change"
                        )));
                    }
                    statements.extend(
                        current
                            .indexes
                            .difference(&target.indexes)
                            .map(|field| drop_index_sql(name, field)),
                    );
                    statements.extend(
                        target
                            .indexes
                            .difference(&current.indexes)
                            .map(|field| create_index_sql(name, field)),
                    );
                }
            }
        }

        Ok(statements)
    }
}

/// Name of the SQLite index serving `field` in `collection`.
pub fn index_name(collection: &str, field: &str) -> String {
    format!("{collection}_{field}_idx")
}

/// SQL expression reading `field` from a record body.
///
/// Queries must use this exact text for SQLite to pick the expression index.
pub fn field_expr(field: &str) -> String {
    format!("json_extract({BODY_COLUMN}, '$.{field}')")
}

fn create_table_sql(name: &str, layout: &CollectionLayout) -> String {
    let key_clause = if layout.auto_increment {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    } else {
        "INTEGER PRIMARY KEY"
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (
            {key} {key_clause},
            {BODY_COLUMN} TEXT NOT NULL CHECK (json_valid({BODY_COLUMN}))
        );",
        key = layout.primary_key,
    )
}

fn create_index_sql(collection: &str, field: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {collection} ({});",
        index_name(collection, field),
        field_expr(field)
    )
}

fn drop_index_sql(collection: &str, field: &str) -> String {
    format!("DROP INDEX IF EXISTS {};", index_name(collection, field))
}

fn validate_identifier(value: &str, context: &str) -> DbResult<()> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(DbError::InvalidLayout(format!(
            "invalid name `{value}` in `{context}`"
        )))
    }
}
