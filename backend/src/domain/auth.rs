//! Login credentials and password verification.
//!
//! Handlers turn form input into [`LoginCredentials`] and hand them to
//! [`authenticate`], which looks the nickname up and compares digests.

use std::fmt;

use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::User;
use crate::domain::persistence_context::PersistenceContext;
use crate::domain::ports::{BlogRepository, PersistenceError};

/// Domain error returned when login form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or whitespace only.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is not blank and is kept exactly as submitted, so it matches
///   the stored nickname byte for byte.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use blog::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" bob ", "secret").unwrap();
/// assert_eq!(creds.username(), " bob ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw form inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        if username.trim().is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Nickname to look up.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Plaintext password as submitted.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Return the user whose nickname and password digest match `credentials`.
///
/// An unknown nickname and a wrong password both yield `Ok(None)`.
pub async fn authenticate(
    repository: &dyn BlogRepository,
    ctx: &mut PersistenceContext,
    credentials: &LoginCredentials,
) -> Result<Option<User>, PersistenceError> {
    let Some(user) = repository.user_by_nick(ctx, credentials.username()).await? else {
        debug!(nick = credentials.username(), "login for unknown nickname");
        return Ok(None);
    };
    if user.password_hash().matches(credentials.password()) {
        Ok(Some(user))
    } else {
        debug!(nick = credentials.username(), "password digest mismatch");
        Ok(None)
    }
}
