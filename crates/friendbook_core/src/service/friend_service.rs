//! Friend use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD and query entry points for core callers.
//! - Host the fixed queries and the fixed transactional insert shown by the
//!   demo.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::friend::{Friend, FriendChanges, FriendId, NewFriend};
use crate::repo::friend_repo::{FriendRepository, RepoResult};

/// Age threshold used by the fixed demo queries.
pub const DEMO_AGE_THRESHOLD: i64 = 20;
/// Name used by the fixed demo queries.
pub const DEMO_NAME: &str = "John Doe";

/// Records written together by [`FriendService::perform_transaction`].
pub fn transaction_friends() -> [NewFriend; 2] {
    [
        NewFriend::new("Alice", 25).with_city("New York"),
        NewFriend::new("Bob", 22).with_city("London"),
    ]
}

/// Use-case service wrapper for friend operations.
pub struct FriendService<R: FriendRepository> {
    repo: R,
}

impl<R: FriendRepository> FriendService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_friend(&self, friend: &NewFriend) -> RepoResult<FriendId> {
        self.repo.create_friend(friend)
    }

    pub fn get_friend(&self, id: FriendId) -> RepoResult<Option<Friend>> {
        self.repo.get_friend(id)
    }

    /// Returns `1` when the record existed and `0` otherwise.
    pub fn update_friend(&self, id: FriendId, changes: &FriendChanges) -> RepoResult<usize> {
        self.repo.update_friend(id, changes)
    }

    pub fn delete_friend(&self, id: FriendId) -> RepoResult<()> {
        self.repo.delete_friend(id)
    }

    pub fn list_friends(&self) -> RepoResult<Vec<Friend>> {
        self.repo.list_friends()
    }

    pub fn friends_older_than(&self, threshold: i64) -> RepoResult<Vec<Friend>> {
        self.repo.friends_older_than(threshold)
    }

    pub fn friends_named(&self, name: &str) -> RepoResult<Vec<Friend>> {
        self.repo.friends_named(name)
    }

    pub fn friends_named_older_than(&self, name: &str, threshold: i64) -> RepoResult<Vec<Friend>> {
        self.repo.friends_named_older_than(name, threshold)
    }

    /// Friends strictly older than 20.
    pub fn friends_older_than_20(&self) -> RepoResult<Vec<Friend>> {
        self.repo.friends_older_than(DEMO_AGE_THRESHOLD)
    }

    /// Every friend named exactly "John Doe".
    pub fn john_does(&self) -> RepoResult<Vec<Friend>> {
        self.repo.friends_named(DEMO_NAME)
    }

    /// Friends named "John Doe" who are older than 20.
    pub fn john_does_over_20(&self) -> RepoResult<Vec<Friend>> {
        self.repo
            .friends_named_older_than(DEMO_NAME, DEMO_AGE_THRESHOLD)
    }

    pub fn insert_friends(&mut self, friends: &[NewFriend]) -> RepoResult<Vec<FriendId>> {
        self.repo.insert_friends(friends)
    }

    /// Writes the two fixed transaction records atomically.
    ///
    /// # Contract
    /// - Both records become visible together, or neither does.
    pub fn perform_transaction(&mut self) -> RepoResult<()> {
        self.repo.insert_friends(&transaction_friends())?;
        Ok(())
    }

    pub fn clear_friends(&self) -> RepoResult<usize> {
        self.repo.clear_friends()
    }

    pub fn count_friends(&self) -> RepoResult<u64> {
        self.repo.count_friends()
    }
}
