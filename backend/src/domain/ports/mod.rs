//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod blog_repository;
mod persistence_session;

pub use blog_repository::BlogRepository;
pub use persistence_session::{PersistenceError, PersistenceSession, SessionSource};
