//! Blog domain: entities, password digests, the per-request persistence
//! context and the ports adapters plug into.
//!
//! Public surface:
//! - `User`, `Entry`, `Comment` and their `New*` counterparts.
//! - `PersistenceContext`, the explicit unit of work passed to every
//!   persistence call.
//! - `ContextBlogRepository`, the query implementation of `BlogRepository`.
//! - `Error` / `ErrorCode`, the transport-agnostic failure type.

pub mod auth;
pub mod blog_repository;
pub mod comment;
pub mod entity;
pub mod entry;
pub mod error;
pub mod password;
pub mod persistence_context;
pub mod ports;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError, authenticate};
pub use self::blog_repository::ContextBlogRepository;
pub use self::comment::{Comment, CommentId, NewComment};
pub use self::entity::EntityValidationError;
pub use self::entry::{Entry, EntryId, EntryParts, NewEntry};
pub use self::error::{Error, ErrorCode};
pub use self::password::PasswordDigest;
pub use self::persistence_context::PersistenceContext;
pub use self::user::{NewUser, User, UserId};
