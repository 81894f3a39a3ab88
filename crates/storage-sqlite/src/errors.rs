//! Storage-specific error types for SQLite operations.
//!
//! This module provides error types that wrap Diesel-specific errors and convert
//! them to the database-agnostic error types defined in `ratekeeper_core`.

use diesel::result::Error as DieselError;
use ratekeeper_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
///
/// These errors are internal to the storage layer and are converted to
/// `ratekeeper_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Core error: {0}")]
    CoreError(String),
}

/// Convert core Error to StorageError (for write_actor transaction wrapper)
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            // Pool construction maps to PoolCreationFailed in `db::create_pool`;
            // what reaches here is a checkout failure.
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::CoreError(e) => Error::Database(DatabaseError::TransactionFailed(e)),
        }
    }
}

/// Extension trait for converting Diesel and r2d2 results to core results.
///
/// The orphan rule forbids `From<DieselError> for ratekeeper_core::Error`,
/// so conversions go through `StorageError`.
pub trait IntoCore<T> {
    fn into_core(self) -> ratekeeper_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> ratekeeper_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> ratekeeper_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_map_to_database_errors() {
        let result: std::result::Result<(), DieselError> = Err(DieselError::NotFound);

        let err = result.into_core().unwrap_err();

        assert!(matches!(err, Error::Database(DatabaseError::QueryFailed(_))));
        assert!(err.is_storage_error());
    }

    #[test]
    fn test_pool_checkout_timeout_maps_to_connection_failure() {
        use diesel::r2d2::{ConnectionManager, Pool};
        use diesel::sqlite::SqliteConnection;
        use std::time::Duration;

        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_millis(50))
            .build(ConnectionManager::<SqliteConnection>::new(":memory:"))
            .unwrap();
        let _held = pool.get().unwrap();

        let err = pool.get().into_core().err().unwrap();

        assert!(matches!(err, Error::Database(DatabaseError::ConnectionFailed(_))));
    }
}
