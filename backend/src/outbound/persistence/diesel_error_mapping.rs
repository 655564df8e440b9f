//! Translation of Diesel and pool failures into [`PersistenceError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use crate::domain::EntityValidationError;
use crate::domain::ports::PersistenceError;

pub(crate) fn map_pool_error(error: PoolError) -> PersistenceError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    PersistenceError::connection(message)
}

/// Map a Diesel error, keeping constraint violations distinguishable.
pub(crate) fn map_diesel_error(error: DieselError) -> PersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => PersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            PersistenceError::conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            PersistenceError::conflict(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PersistenceError::connection("database connection error")
        }
        DieselError::BrokenTransactionManager => {
            PersistenceError::connection("transaction manager is broken")
        }
        DieselError::NotInTransaction | DieselError::AlreadyInTransaction => {
            PersistenceError::query("transaction state mismatch")
        }
        _ => PersistenceError::query("database error"),
    }
}

pub(crate) fn map_row_error(error: EntityValidationError) -> PersistenceError {
    PersistenceError::query(format!("stored row is invalid: {error}"))
}
