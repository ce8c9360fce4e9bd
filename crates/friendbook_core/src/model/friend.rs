//! Friend domain model.
//!
//! # Responsibility
//! - Define the record stored in the `friends` collection.
//! - Describe partial updates and validate record shape before writes.
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never changes.
//! - `name` is never blank and `age` is never negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identifier of a friend record.
pub type FriendId = i64;

/// Shape violations rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendValidationError {
    EmptyName,
    NegativeAge(i64),
}

impl Display for FriendValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "friend name cannot be empty"),
            Self::NegativeAge(age) => write!(f, "friend age cannot be negative, got {age}"),
        }
    }
}

impl Error for FriendValidationError {}

/// Friend record before the store has assigned an identifier.
///
/// This is also the persisted document body; the identifier lives in the
/// primary key column instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFriend {
    pub name: String,
    pub age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl NewFriend {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
            city: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Checks the record against the collection's declared shape.
    pub fn validate(&self) -> Result<(), FriendValidationError> {
        validate_name(&self.name)?;
        validate_age(self.age)
    }

    /// Attaches a store-assigned identifier.
    pub fn into_friend(self, id: FriendId) -> Friend {
        Friend {
            id,
            name: self.name,
            age: self.age,
            city: self.city,
        }
    }
}

/// Friend record as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
    pub age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Friend {
    /// Applies a partial update in place. `id` is never touched.
    pub fn apply(&mut self, changes: &FriendChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
        if let Some(city) = &changes.city {
            self.city = city.clone();
        }
    }
}

/// Partial update for a friend record.
///
/// `None` leaves a field unchanged. For `city`, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub city: Option<Option<String>>,
}

impl FriendChanges {
    pub fn age(age: i64) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.city.is_none()
    }

    /// Validates only the fields being changed.
    pub fn validate(&self) -> Result<(), FriendValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), FriendValidationError> {
    if name.trim().is_empty() {
        return Err(FriendValidationError::EmptyName);
    }
    Ok(())
}

fn validate_age(age: i64) -> Result<(), FriendValidationError> {
    if age < 0 {
        return Err(FriendValidationError::NegativeAge(age));
    }
    Ok(())
}
