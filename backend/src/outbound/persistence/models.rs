//! Internal Diesel row structs.
//!
//! These types never leave the persistence adapter. Conversions into domain
//! values re-run entity validation so a malformed row surfaces as a query
//! error instead of an invalid entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{blog_comments, blog_entries, blog_users};
use crate::domain::{
    Comment, CommentId, EntityValidationError, Entry, EntryId, EntryParts, NewComment, NewEntry,
    NewUser, PasswordDigest, User, UserId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blog_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nick: String,
    pub email: String,
    pub password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = EntityValidationError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::restore(
            UserId::new(row.id),
            row.first_name,
            row.last_name,
            row.nick,
            row.email,
            PasswordDigest::from_hex(row.password_hash)?,
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blog_users)]
pub(crate) struct NewUserRow<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub nick: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

impl<'a> From<&'a NewUser> for NewUserRow<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            first_name: user.first_name(),
            last_name: user.last_name(),
            nick: user.nick(),
            email: user.email(),
            password_hash: user.password_hash().as_str(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blog_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EntryRow {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = EntityValidationError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Entry::restore(EntryParts {
            id: EntryId::new(row.id),
            creator_id: UserId::new(row.creator_id),
            title: row.title,
            text: row.body,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
        })
    }
}

/// New entries store the creation time as their first modification time.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blog_entries)]
pub(crate) struct NewEntryRow<'a> {
    pub creator_id: i64,
    pub title: &'a str,
    pub body: &'a str,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl<'a> From<&'a NewEntry> for NewEntryRow<'a> {
    fn from(entry: &'a NewEntry) -> Self {
        Self {
            creator_id: entry.creator_id().get(),
            title: entry.title(),
            body: entry.text(),
            created_at: entry.created_at(),
            last_modified_at: entry.created_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = blog_entries)]
pub(crate) struct EntryUpdate<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub last_modified_at: DateTime<Utc>,
}

impl<'a> From<&'a Entry> for EntryUpdate<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            title: entry.title(),
            body: entry.text(),
            last_modified_at: entry.last_modified_at(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = blog_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub entry_id: i64,
    pub users_email: String,
    pub message: String,
    pub posted_on: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = EntityValidationError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Comment::restore(
            CommentId::new(row.id),
            EntryId::new(row.entry_id),
            row.users_email,
            row.message,
            row.posted_on,
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blog_comments)]
pub(crate) struct NewCommentRow<'a> {
    pub entry_id: i64,
    pub users_email: &'a str,
    pub message: &'a str,
    pub posted_on: DateTime<Utc>,
}

impl<'a> From<&'a NewComment> for NewCommentRow<'a> {
    fn from(comment: &'a NewComment) -> Self {
        Self {
            entry_id: comment.entry_id().get(),
            users_email: comment.users_email(),
            message: comment.message(),
            posted_on: comment.posted_on(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn user_row_maps_to_domain_user() {
        let row = UserRow {
            id: 4,
            first_name: "Bob".to_owned(),
            last_name: "Builder".to_owned(),
            nick: "bob".to_owned(),
            email: "bob@example.com".to_owned(),
            password_hash: "e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4".to_owned(),
        };
        let user = User::try_from(row).expect("valid row");
        assert_eq!(user.id(), UserId::new(4));
        assert!(user.password_hash().matches("secret"));
    }

    #[rstest]
    fn user_row_with_plaintext_password_is_rejected() {
        let row = UserRow {
            id: 4,
            first_name: String::new(),
            last_name: String::new(),
            nick: "bob".to_owned(),
            email: String::new(),
            password_hash: "secret".to_owned(),
        };
        assert_eq!(
            User::try_from(row).expect_err("malformed digest"),
            EntityValidationError::MalformedDigest
        );
    }

    #[rstest]
    fn entry_body_column_maps_to_text() {
        let row = EntryRow {
            id: 9,
            creator_id: 4,
            title: "Title".to_owned(),
            body: "Body".to_owned(),
            created_at: timestamp(),
            last_modified_at: timestamp(),
        };
        let entry = Entry::try_from(row).expect("valid row");
        assert_eq!(entry.text(), "Body");
        assert_eq!(entry.creator_id(), UserId::new(4));
    }

    #[rstest]
    fn new_entry_row_starts_with_creation_time() {
        let user = NewUser::new("Bob", "Builder", "bob", "bob@example.com", "secret")
            .expect("valid user")
            .into_user(UserId::new(4));
        let entry = NewEntry::new(&user, "T", "B", timestamp()).expect("valid entry");
        let row = NewEntryRow::from(&entry);
        assert_eq!(row.creator_id, 4);
        assert_eq!(row.last_modified_at, row.created_at);
    }

    #[rstest]
    fn over_length_comment_row_is_rejected() {
        let row = CommentRow {
            id: 1,
            entry_id: 9,
            users_email: "x@y.com".to_owned(),
            message: "m".repeat(2049),
            posted_on: timestamp(),
        };
        assert!(Comment::try_from(row).is_err());
    }
}
