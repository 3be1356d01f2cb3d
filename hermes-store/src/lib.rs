pub mod app_config;
pub mod database;
pub mod memory;
pub mod user_repo;
pub mod trip_repo;
pub mod booking_repo;
pub mod review_repo;
mod rows;

pub use app_config::{Config, StorageBackend};
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use user_repo::StoreUserRepository;
pub use trip_repo::StoreTripRepository;
pub use booking_repo::StoreBookingRepository;
pub use review_repo::StoreReviewRepository;

use hermes_core::CoreError;

/// Map a driver error onto the shared taxonomy. Unique violations that carry
/// domain meaning are translated at the call site before reaching here.
pub(crate) fn db_err(err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::RowNotFound => CoreError::not_found("Record"),
        other => {
            tracing::error!("Database error: {:?}", other);
            CoreError::Internal("database error".to_string())
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
