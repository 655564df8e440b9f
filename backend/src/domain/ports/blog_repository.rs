//! Read-only access to blog records.
//!
//! Each call runs inside the caller's [`PersistenceContext`]: it binds the
//! context's session, runs one query and closes the context again, so the
//! result reflects committed state as of the call.

use async_trait::async_trait;

use super::PersistenceError;
use crate::domain::persistence_context::PersistenceContext;
use crate::domain::{Comment, Entry, EntryId, User, UserId};

/// Query port used by the HTTP handlers.
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Every registered user, ordered by id.
    async fn all_users(&self, ctx: &mut PersistenceContext) -> Result<Vec<User>, PersistenceError>;

    /// The user registered under `nick`, if exactly one exists.
    ///
    /// Several matches are reported as [`PersistenceError::Query`].
    async fn user_by_nick(
        &self,
        ctx: &mut PersistenceContext,
        nick: &str,
    ) -> Result<Option<User>, PersistenceError>;

    async fn user_by_id(
        &self,
        ctx: &mut PersistenceContext,
        id: UserId,
    ) -> Result<Option<User>, PersistenceError>;

    /// Every entry, oldest first.
    async fn all_entries(&self, ctx: &mut PersistenceContext)
    -> Result<Vec<Entry>, PersistenceError>;

    /// Entries written by `creator`, oldest first.
    async fn entries_by_creator(
        &self,
        ctx: &mut PersistenceContext,
        creator: &User,
    ) -> Result<Vec<Entry>, PersistenceError>;

    async fn entry_by_id(
        &self,
        ctx: &mut PersistenceContext,
        id: EntryId,
    ) -> Result<Option<Entry>, PersistenceError>;

    /// Comments on `entry`, oldest first.
    async fn comments_for_entry(
        &self,
        ctx: &mut PersistenceContext,
        entry: &Entry,
    ) -> Result<Vec<Comment>, PersistenceError>;
}
