//! The [`BlogRepository`] implementation used by the server.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::persistence_context::PersistenceContext;
use crate::domain::ports::{BlogRepository, PersistenceError};
use crate::domain::{Comment, Entry, EntryId, User, UserId};

/// Runs each query in its own short transaction on the caller's context.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextBlogRepository;

#[async_trait]
impl BlogRepository for ContextBlogRepository {
    async fn all_users(&self, ctx: &mut PersistenceContext) -> Result<Vec<User>, PersistenceError> {
        let users = ctx.session().await?.list_users().await?;
        ctx.close().await?;
        Ok(users)
    }

    async fn user_by_nick(
        &self,
        ctx: &mut PersistenceContext,
        nick: &str,
    ) -> Result<Option<User>, PersistenceError> {
        let mut matches = ctx.session().await?.users_by_nick(nick).await?;
        ctx.close().await?;
        if matches.len() > 1 {
            warn!(nick, count = matches.len(), "nickname matches several users");
            return Err(PersistenceError::query(format!(
                "nickname {nick} matches {} users",
                matches.len()
            )));
        }
        Ok(matches.pop())
    }

    async fn user_by_id(
        &self,
        ctx: &mut PersistenceContext,
        id: UserId,
    ) -> Result<Option<User>, PersistenceError> {
        let user = ctx.session().await?.find_user(id).await?;
        ctx.close().await?;
        Ok(user)
    }

    async fn all_entries(
        &self,
        ctx: &mut PersistenceContext,
    ) -> Result<Vec<Entry>, PersistenceError> {
        let entries = ctx.session().await?.list_entries().await?;
        ctx.close().await?;
        Ok(entries)
    }

    async fn entries_by_creator(
        &self,
        ctx: &mut PersistenceContext,
        creator: &User,
    ) -> Result<Vec<Entry>, PersistenceError> {
        let entries = ctx.session().await?.entries_by_creator(creator.id()).await?;
        ctx.close().await?;
        Ok(entries)
    }

    async fn entry_by_id(
        &self,
        ctx: &mut PersistenceContext,
        id: EntryId,
    ) -> Result<Option<Entry>, PersistenceError> {
        let entry = ctx.session().await?.find_entry(id).await?;
        ctx.close().await?;
        Ok(entry)
    }

    async fn comments_for_entry(
        &self,
        ctx: &mut PersistenceContext,
        entry: &Entry,
    ) -> Result<Vec<Comment>, PersistenceError> {
        let comments = ctx.session().await?.comments_for_entry(entry.id()).await?;
        ctx.close().await?;
        Ok(comments)
    }
}
