//! Shared validation for blog entities.
//!
//! Every text field stored by the blog has an upper length bound matching
//! its column width. Lengths are counted in Unicode scalar values.

use thiserror::Error;

/// Maximum length of a user's first or last name.
pub const NAME_MAX: usize = 50;
/// Maximum length of a nickname.
pub const NICK_MAX: usize = 50;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 254;
/// Maximum length of an entry title.
pub const TITLE_MAX: usize = 50;
/// Maximum length of an entry body.
pub const TEXT_MAX: usize = 4096;
/// Maximum length of a comment message.
pub const MESSAGE_MAX: usize = 2048;

/// Validation errors raised by entity constructors and setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityValidationError {
    /// A bounded text field exceeded its limit.
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// A field that identifies a record was blank.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    /// A stored password digest was not 40 lowercase hex characters.
    #[error("password digest is malformed")]
    MalformedDigest,
}

/// Accept `value` when it fits within `max` characters.
pub(crate) fn bounded(
    field: &'static str,
    value: impl Into<String>,
    max: usize,
) -> Result<String, EntityValidationError> {
    let value = value.into();
    let actual = value.chars().count();
    if actual > max {
        return Err(EntityValidationError::TooLong { field, max, actual });
    }
    Ok(value)
}

/// Accept `value` when it is non-blank and fits within `max` characters.
pub(crate) fn required(
    field: &'static str,
    value: impl Into<String>,
    max: usize,
) -> Result<String, EntityValidationError> {
    let value = bounded(field, value, max)?;
    if value.trim().is_empty() {
        return Err(EntityValidationError::Empty { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0)]
    #[case("abc", 3)]
    #[case("ééé", 3)]
    fn bounded_accepts_values_at_or_below_limit(#[case] value: &str, #[case] max: usize) {
        assert_eq!(bounded("field", value, max).as_deref(), Ok(value));
    }

    #[rstest]
    fn bounded_counts_characters_not_bytes() {
        let err = bounded("title", "ąąą", 2).expect_err("too long");
        assert_eq!(
            err,
            EntityValidationError::TooLong {
                field: "title",
                max: 2,
                actual: 3,
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn required_rejects_blank_values(#[case] value: &str) {
        assert_eq!(
            required("nick", value, NICK_MAX),
            Err(EntityValidationError::Empty { field: "nick" })
        );
    }
}
