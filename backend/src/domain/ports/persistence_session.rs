//! Driven port for transactional access to blog storage.
//!
//! A [`SessionSource`] opens [`PersistenceSession`]s. Every session owns one
//! transaction, begun when the session is opened. Reads observe the
//! session's own writes; other sessions see them only after
//! [`PersistenceSession::commit`]. A session that is dropped or released
//! without committing discards its writes.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{
    Comment, Entry, EntryId, NewComment, NewEntry, NewUser, User, UserId,
};

define_port_error! {
    /// Errors raised by persistence adapters and the persistence context.
    pub enum PersistenceError {
        /// The store could not be reached or a connection was lost.
        Connection { message: String } => "persistence connection failed: {message}",
        /// A query failed or returned data that cannot be mapped.
        Query { message: String } => "persistence query failed: {message}",
        /// A write violated a uniqueness or reference constraint.
        Conflict { message: String } => "persistence conflict: {message}",
        /// Committing the transaction failed.
        Commit { message: String } => "transaction commit failed: {message}",
        /// Releasing the session failed.
        Release { message: String } => "session release failed: {message}",
        /// Both the commit and the release failed while closing a context.
        Teardown { commit: String, release: String } =>
            "transaction commit failed: {commit}; session release failed: {release}",
    }
}

/// Opens sessions against a concrete store.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Create a session and begin its transaction.
    async fn open(&self) -> Result<Box<dyn PersistenceSession>, PersistenceError>;
}

/// A unit of work over the blog tables.
///
/// Ordering contract: users by id, entries by creation time then id,
/// comments by post time then id.
#[async_trait]
pub trait PersistenceSession: Send {
    /// Every stored user.
    async fn list_users(&mut self) -> Result<Vec<User>, PersistenceError>;

    /// Users whose nickname equals `nick`.
    async fn users_by_nick(&mut self, nick: &str) -> Result<Vec<User>, PersistenceError>;

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, PersistenceError>;

    /// Every stored entry.
    async fn list_entries(&mut self) -> Result<Vec<Entry>, PersistenceError>;

    async fn entries_by_creator(&mut self, creator: UserId)
    -> Result<Vec<Entry>, PersistenceError>;

    async fn find_entry(&mut self, id: EntryId) -> Result<Option<Entry>, PersistenceError>;

    async fn comments_for_entry(&mut self, entry: EntryId)
    -> Result<Vec<Comment>, PersistenceError>;

    /// Insert a user, failing with [`PersistenceError::Conflict`] when the
    /// nickname is taken.
    async fn persist_user(&mut self, user: &NewUser) -> Result<User, PersistenceError>;

    async fn persist_entry(&mut self, entry: &NewEntry) -> Result<Entry, PersistenceError>;

    /// Overwrite the stored title, body and last-modified time of `entry`.
    async fn merge_entry(&mut self, entry: &Entry) -> Result<Entry, PersistenceError>;

    async fn persist_comment(&mut self, comment: &NewComment)
    -> Result<Comment, PersistenceError>;

    /// Delete an entry and its comments. Returns whether the entry existed.
    async fn remove_entry(&mut self, id: EntryId) -> Result<bool, PersistenceError>;

    /// Make this session's writes durable and visible to other sessions.
    async fn commit(&mut self) -> Result<(), PersistenceError>;

    /// Give the underlying resources back, rolling back uncommitted work.
    ///
    /// The session is unusable afterwards.
    async fn release(&mut self) -> Result<(), PersistenceError>;
}
