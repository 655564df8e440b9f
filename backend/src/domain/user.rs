//! Blog users.
//!
//! A [`NewUser`] is built from registration input and carries no identity;
//! storing it yields a [`User`] with a surrogate id. Persisted users compare
//! and hash by nickname, which is unique across the store.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::entity::{EMAIL_MAX, EntityValidationError, NAME_MAX, NICK_MAX, bounded, required};
use crate::domain::password::PasswordDigest;

/// Surrogate identifier of a stored user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated registration data awaiting persistence.
///
/// # Examples
/// ```
/// use blog::domain::NewUser;
///
/// let user = NewUser::new("Alice", "Liddell", "alice", "alice@example.com", "rabbit")?;
/// assert!(user.password_hash().matches("rabbit"));
/// # Ok::<(), blog::domain::EntityValidationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NewUser {
    first_name: String,
    last_name: String,
    nick: String,
    email: String,
    password_hash: PasswordDigest,
}

impl NewUser {
    /// Validate registration fields and derive the password digest.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        nick: impl Into<String>,
        email: impl Into<String>,
        password: &str,
    ) -> Result<Self, EntityValidationError> {
        Ok(Self {
            first_name: bounded("first name", first_name, NAME_MAX)?,
            last_name: bounded("last name", last_name, NAME_MAX)?,
            nick: required("nickname", nick, NICK_MAX)?,
            email: bounded("email", email, EMAIL_MAX)?,
            password_hash: PasswordDigest::from_plaintext(password),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordDigest {
        &self.password_hash
    }

    /// Attach the identifier assigned by the store.
    pub fn into_user(self, id: UserId) -> User {
        let Self {
            first_name,
            last_name,
            nick,
            email,
            password_hash,
        } = self;
        User {
            id,
            first_name,
            last_name,
            nick,
            email,
            password_hash,
        }
    }
}

/// Stored blog user.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    nick: String,
    email: String,
    password_hash: PasswordDigest,
}

impl User {
    /// Rebuild a user from stored columns, re-checking field bounds.
    pub fn restore(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        nick: impl Into<String>,
        email: impl Into<String>,
        password_hash: PasswordDigest,
    ) -> Result<Self, EntityValidationError> {
        Ok(Self {
            id,
            first_name: bounded("first name", first_name, NAME_MAX)?,
            last_name: bounded("last name", last_name, NAME_MAX)?,
            nick: required("nickname", nick, NICK_MAX)?,
            email: bounded("email", email, EMAIL_MAX)?,
            password_hash,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordDigest {
        &self.password_hash
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.nick == other.nick
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nick.hash(state);
    }
}
