//! One-way password digests.
//!
//! Passwords are stored as the lowercase hexadecimal SHA-1 digest of their
//! encoded plaintext. There is no salt and no iteration count; a login
//! succeeds when the digest of the submitted password equals the stored one.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::domain::entity::EntityValidationError;

/// Byte length of a SHA-1 digest.
pub const DIGEST_LEN: usize = 20;

/// Character length of a hex-rendered digest.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// Text encodings accepted by [`sha1_str`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, the encoding used for stored password digests.
    #[default]
    Utf8,
    /// UTF-16 big endian without a byte-order mark.
    Utf16Be,
    /// UTF-16 little endian without a byte-order mark.
    Utf16Le,
}

impl TextEncoding {
    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

/// Compute the SHA-1 digest of raw bytes.
pub fn sha1(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let output = hasher.finalize();
    let mut digest = [0_u8; DIGEST_LEN];
    digest.copy_from_slice(&output);
    digest
}

/// Compute the SHA-1 digest of `text` after encoding it with `encoding`.
///
/// # Examples
/// ```
/// use blog::domain::password::{sha1, sha1_str, TextEncoding};
///
/// assert_eq!(sha1_str("abc", TextEncoding::Utf8), sha1(b"abc"));
/// assert_ne!(sha1_str("abc", TextEncoding::Utf16Be), sha1(b"abc"));
/// ```
pub fn sha1_str(text: &str, encoding: TextEncoding) -> [u8; DIGEST_LEN] {
    sha1(&encoding.encode(text))
}

/// Render the UTF-8 SHA-1 digest of `text` as 40 lowercase hex characters.
///
/// Leading zero bytes are kept, so the output length never varies.
///
/// # Examples
/// ```
/// use blog::domain::password::sha1_hex;
///
/// assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
/// ```
pub fn sha1_hex(text: &str) -> String {
    hex::encode(sha1_str(text, TextEncoding::Utf8))
}

/// Stored password digest.
///
/// ## Invariants
/// - Always exactly [`DIGEST_HEX_LEN`] lowercase hexadecimal characters.
/// - Never holds plaintext.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Derive the digest of a plaintext password.
    pub fn from_plaintext(plaintext: &str) -> Self {
        Self(sha1_hex(plaintext))
    }

    /// Rehydrate a digest read back from storage.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, EntityValidationError> {
        let value = value.into();
        let well_formed = value.len() == DIGEST_HEX_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if well_formed {
            Ok(Self(value))
        } else {
            Err(EntityValidationError::MalformedDigest)
        }
    }

    /// Whether `plaintext` hashes to this digest.
    pub fn matches(&self, plaintext: &str) -> bool {
        sha1_hex(plaintext) == self.0
    }

    /// Hex rendering of the digest.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PasswordDigest").field(&"<redacted>").finish()
    }
}
