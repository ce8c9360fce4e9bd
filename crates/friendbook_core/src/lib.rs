//! Core of Friendbook: a small friends collection on an embedded document store.
//! This crate owns record shape, storage bootstrap and the demo walkthrough.

pub mod db;
pub mod demo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use demo::{clear_db_data, run_all_examples, DemoLog};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::friend::{Friend, FriendChanges, FriendId, FriendValidationError, NewFriend};
pub use repo::friend_repo::{FriendRepository, RepoError, RepoResult, SqliteFriendRepository};
pub use service::friend_service::{transaction_friends, FriendService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
