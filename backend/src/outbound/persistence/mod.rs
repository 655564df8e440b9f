//! PostgreSQL persistence adapter using Diesel.
//!
//! - **Thin adapter**: sessions only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Async pooling**: connections come from a bb8 pool through
//!   `diesel-async`.
//!
//! # Example
//!
//! ```ignore
//! use blog::outbound::persistence::{DbPool, DieselSessionSource, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/blog")).await?;
//! let sessions = DieselSessionSource::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_session;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_session::DieselSessionSource;
pub use migrations::{MigrationError, apply_pending_migrations};
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
