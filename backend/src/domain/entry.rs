//! Blog entries.
//!
//! An entry belongs to exactly one creator and records when it was created
//! and last modified. Persisted entries compare and hash by id.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::domain::entity::{EntityValidationError, TEXT_MAX, TITLE_MAX, bounded};
use crate::domain::user::{User, UserId};

/// Surrogate identifier of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(i64);

impl EntryId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entry awaiting its first persist.
#[derive(Debug, Clone)]
pub struct NewEntry {
    creator_id: UserId,
    title: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl NewEntry {
    /// Validate a new entry owned by `creator`.
    ///
    /// The last-modified timestamp of the stored entry starts equal to
    /// `created_at`.
    pub fn new(
        creator: &User,
        title: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EntityValidationError> {
        Ok(Self {
            creator_id: creator.id(),
            title: bounded("title", title, TITLE_MAX)?,
            text: bounded("text", text, TEXT_MAX)?,
            created_at,
        })
    }

    /// An untitled entry, as created by the "new entry" page.
    pub fn blank(creator: &User, created_at: DateTime<Utc>) -> Self {
        Self {
            creator_id: creator.id(),
            title: String::new(),
            text: String::new(),
            created_at,
        }
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attach the identifier assigned by the store.
    pub fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            creator_id: self.creator_id,
            title: self.title,
            text: self.text,
            created_at: self.created_at,
            last_modified_at: self.created_at,
        }
    }
}

/// Stored blog entry.
#[derive(Debug, Clone)]
pub struct Entry {
    id: EntryId,
    creator_id: UserId,
    title: String,
    text: String,
    created_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
}

/// Stored columns of an entry, used to rebuild it.
#[derive(Debug, Clone)]
pub struct EntryParts {
    pub id: EntryId,
    pub creator_id: UserId,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl Entry {
    /// Rebuild an entry from stored columns, re-checking field bounds.
    pub fn restore(parts: EntryParts) -> Result<Self, EntityValidationError> {
        let EntryParts {
            id,
            creator_id,
            title,
            text,
            created_at,
            last_modified_at,
        } = parts;
        Ok(Self {
            id,
            creator_id,
            title: bounded("title", title, TITLE_MAX)?,
            text: bounded("text", text, TEXT_MAX)?,
            created_at,
            last_modified_at,
        })
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }

    /// Replace title and body, stamping the modification time.
    ///
    /// Nothing changes when either value is rejected.
    ///
    /// # Examples
    /// ```
    /// use blog::domain::{Entry, EntryId, EntryParts, UserId};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let mut entry = Entry::restore(EntryParts {
    ///     id: EntryId::new(1),
    ///     creator_id: UserId::new(1),
    ///     title: String::new(),
    ///     text: String::new(),
    ///     created_at: created,
    ///     last_modified_at: created,
    /// })?;
    /// let edited = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    /// entry.edit("Hello", "First post", edited)?;
    /// assert_eq!(entry.title(), "Hello");
    /// assert_eq!(entry.last_modified_at(), edited);
    /// # Ok::<(), blog::domain::EntityValidationError>(())
    /// ```
    pub fn edit(
        &mut self,
        title: impl Into<String>,
        text: impl Into<String>,
        modified_at: DateTime<Utc>,
    ) -> Result<(), EntityValidationError> {
        let title = bounded("title", title, TITLE_MAX)?;
        let text = bounded("text", text, TEXT_MAX)?;
        self.title = title;
        self.text = text;
        self.last_modified_at = modified_at;
        Ok(())
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
