//! PostgreSQL-backed [`SessionSource`].
//!
//! Opening a session checks out a pooled connection and issues `BEGIN`;
//! the connection stays checked out until the session is released.
//! Removing an entry deletes its comments first instead of relying on the
//! `ON DELETE CASCADE` clause alone.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::debug;

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::{
    CommentRow, EntryRow, EntryUpdate, NewCommentRow, NewEntryRow, NewUserRow, UserRow,
};
use super::pool::{DbPool, OwnedConnection};
use super::schema::{blog_comments, blog_entries, blog_users};
use crate::domain::ports::{PersistenceError, PersistenceSession, SessionSource};
use crate::domain::{
    Comment, EntityValidationError, Entry, EntryId, NewComment, NewEntry, NewUser, User, UserId,
};

/// Opens one transaction per session on a pooled connection.
#[derive(Clone)]
pub struct DieselSessionSource {
    pool: DbPool,
}

impl DieselSessionSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionSource for DieselSessionSource {
    async fn open(&self) -> Result<Box<dyn PersistenceSession>, PersistenceError> {
        let mut conn = self.pool.checkout().await.map_err(map_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Box::new(DieselSession { conn: Some(conn) }))
    }
}

/// Session holding a checked-out connection with an open transaction.
///
/// A connection dropped while still inside a transaction is reported as
/// broken to bb8 and discarded, which rolls the transaction back.
struct DieselSession {
    conn: Option<OwnedConnection>,
}

impl DieselSession {
    fn conn(&mut self) -> Result<&mut AsyncPgConnection, PersistenceError> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| PersistenceError::connection("session already released"))
    }
}

fn rows_into<R, T>(rows: Vec<R>) -> Result<Vec<T>, PersistenceError>
where
    T: TryFrom<R, Error = EntityValidationError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(map_row_error))
        .collect()
}

fn row_into<R, T>(row: R) -> Result<T, PersistenceError>
where
    T: TryFrom<R, Error = EntityValidationError>,
{
    T::try_from(row).map_err(map_row_error)
}

#[async_trait]
impl PersistenceSession for DieselSession {
    async fn list_users(&mut self) -> Result<Vec<User>, PersistenceError> {
        let rows: Vec<UserRow> = blog_users::table
            .order(blog_users::id.asc())
            .select(UserRow::as_select())
            .load(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        rows_into(rows)
    }

    async fn users_by_nick(&mut self, nick: &str) -> Result<Vec<User>, PersistenceError> {
        let rows: Vec<UserRow> = blog_users::table
            .filter(blog_users::nick.eq(nick))
            .order(blog_users::id.asc())
            .select(UserRow::as_select())
            .load(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        rows_into(rows)
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, PersistenceError> {
        let row: Option<UserRow> = blog_users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(self.conn()?)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_into).transpose()
    }

    async fn list_entries(&mut self) -> Result<Vec<Entry>, PersistenceError> {
        let rows: Vec<EntryRow> = blog_entries::table
            .order((blog_entries::created_at.asc(), blog_entries::id.asc()))
            .select(EntryRow::as_select())
            .load(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        rows_into(rows)
    }

    async fn entries_by_creator(
        &mut self,
        creator: UserId,
    ) -> Result<Vec<Entry>, PersistenceError> {
        let rows: Vec<EntryRow> = blog_entries::table
            .filter(blog_entries::creator_id.eq(creator.get()))
            .order((blog_entries::created_at.asc(), blog_entries::id.asc()))
            .select(EntryRow::as_select())
            .load(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        rows_into(rows)
    }

    async fn find_entry(&mut self, id: EntryId) -> Result<Option<Entry>, PersistenceError> {
        let row: Option<EntryRow> = blog_entries::table
            .find(id.get())
            .select(EntryRow::as_select())
            .first(self.conn()?)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_into).transpose()
    }

    async fn comments_for_entry(
        &mut self,
        entry: EntryId,
    ) -> Result<Vec<Comment>, PersistenceError> {
        let rows: Vec<CommentRow> = blog_comments::table
            .filter(blog_comments::entry_id.eq(entry.get()))
            .order((blog_comments::posted_on.asc(), blog_comments::id.asc()))
            .select(CommentRow::as_select())
            .load(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        rows_into(rows)
    }

    async fn persist_user(&mut self, user: &NewUser) -> Result<User, PersistenceError> {
        let row: UserRow = diesel::insert_into(blog_users::table)
            .values(NewUserRow::from(user))
            .returning(UserRow::as_returning())
            .get_result(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        row_into(row)
    }

    async fn persist_entry(&mut self, entry: &NewEntry) -> Result<Entry, PersistenceError> {
        let row: EntryRow = diesel::insert_into(blog_entries::table)
            .values(NewEntryRow::from(entry))
            .returning(EntryRow::as_returning())
            .get_result(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        row_into(row)
    }

    async fn merge_entry(&mut self, entry: &Entry) -> Result<Entry, PersistenceError> {
        let row: Option<EntryRow> = diesel::update(blog_entries::table.find(entry.id().get()))
            .set(EntryUpdate::from(entry))
            .returning(EntryRow::as_returning())
            .get_result(self.conn()?)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match row {
            Some(row) => row_into(row),
            None => Err(PersistenceError::query(format!(
                "entry {} not found",
                entry.id()
            ))),
        }
    }

    async fn persist_comment(
        &mut self,
        comment: &NewComment,
    ) -> Result<Comment, PersistenceError> {
        let row: CommentRow = diesel::insert_into(blog_comments::table)
            .values(NewCommentRow::from(comment))
            .returning(CommentRow::as_returning())
            .get_result(self.conn()?)
            .await
            .map_err(map_diesel_error)?;
        row_into(row)
    }

    async fn remove_entry(&mut self, id: EntryId) -> Result<bool, PersistenceError> {
        let conn = self.conn()?;
        let comments = diesel::delete(blog_comments::table.filter(blog_comments::entry_id.eq(id.get())))
            .execute(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        let entries = diesel::delete(blog_entries::table.find(id.get()))
            .execute(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(entry = %id, comments, "entry removed");
        Ok(entries > 0)
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        AnsiTransactionManager::commit_transaction(self.conn()?)
            .await
            .map_err(map_diesel_error)
    }

    async fn release(&mut self) -> Result<(), PersistenceError> {
        let Some(mut conn) = self.conn.take() else {
            return Err(PersistenceError::connection("session already released"));
        };
        let open = AnsiTransactionManager::transaction_manager_status_mut(&mut *conn)
            .transaction_depth()
            .map_or(true, |depth| depth.is_some());
        if open {
            AnsiTransactionManager::rollback_transaction(&mut *conn)
                .await
                .map_err(map_diesel_error)?;
            debug!("uncommitted transaction rolled back");
        }
        Ok(())
    }
}
