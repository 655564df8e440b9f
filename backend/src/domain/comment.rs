//! Comments left on blog entries.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::domain::entity::{EMAIL_MAX, EntityValidationError, MESSAGE_MAX, bounded};
use crate::domain::entry::{Entry, EntryId};

/// Surrogate identifier of a stored comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(i64);

impl CommentId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comment awaiting persistence.
///
/// The commenter's email is stored as given; it is not checked for being a
/// deliverable address.
#[derive(Debug, Clone)]
pub struct NewComment {
    entry_id: EntryId,
    users_email: String,
    message: String,
    posted_on: DateTime<Utc>,
}

impl NewComment {
    pub fn new(
        entry: &Entry,
        users_email: impl Into<String>,
        message: impl Into<String>,
        posted_on: DateTime<Utc>,
    ) -> Result<Self, EntityValidationError> {
        Ok(Self {
            entry_id: entry.id(),
            users_email: bounded("email", users_email, EMAIL_MAX)?,
            message: bounded("message", message, MESSAGE_MAX)?,
            posted_on,
        })
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn users_email(&self) -> &str {
        &self.users_email
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn posted_on(&self) -> DateTime<Utc> {
        self.posted_on
    }

    /// Attach the identifier assigned by the store.
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            entry_id: self.entry_id,
            users_email: self.users_email,
            message: self.message,
            posted_on: self.posted_on,
        }
    }
}

/// Stored comment.
#[derive(Debug, Clone)]
pub struct Comment {
    id: CommentId,
    entry_id: EntryId,
    users_email: String,
    message: String,
    posted_on: DateTime<Utc>,
}

impl Comment {
    /// Rebuild a comment from stored columns, re-checking field bounds.
    pub fn restore(
        id: CommentId,
        entry_id: EntryId,
        users_email: impl Into<String>,
        message: impl Into<String>,
        posted_on: DateTime<Utc>,
    ) -> Result<Self, EntityValidationError> {
        Ok(Self {
            id,
            entry_id,
            users_email: bounded("email", users_email, EMAIL_MAX)?,
            message: bounded("message", message, MESSAGE_MAX)?,
            posted_on,
        })
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn users_email(&self) -> &str {
        &self.users_email
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn posted_on(&self) -> DateTime<Utc> {
        self.posted_on
    }
}

impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Comment {}

impl Hash for Comment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
