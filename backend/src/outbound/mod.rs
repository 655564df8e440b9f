//! Outbound adapters implementing domain ports for storage.
//!
//! - **persistence**: PostgreSQL sessions over Diesel and a bb8 pool.
//! - **memory**: a process-local store with the same transactional
//!   behaviour, used when no database is configured and in tests.
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
