pub mod repository;
pub mod identity;

use hermes_booking::BookingError;
use hermes_catalog::{InventoryError, TripError};
use hermes_review::ReviewError;
use hermes_shared::UnknownRole;

use crate::identity::IdentityError;

/// Failure taxonomy shared by every repository and handler.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(what: &str) -> Self {
        CoreError::NotFound(format!("{what} not found"))
    }
}

impl From<InventoryError> for CoreError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InvalidCounters { .. } => CoreError::Internal(err.to_string()),
            _ => CoreError::Validation(err.to_string()),
        }
    }
}

impl From<TripError> for CoreError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::Inventory(inner) => inner.into(),
            TripError::DriverRoleRequired | TripError::NotOwner => CoreError::Forbidden(err.to_string()),
            TripError::InvalidTransition { .. } => CoreError::Conflict(err.to_string()),
            TripError::UnknownStatus(_) => CoreError::Internal(err.to_string()),
            TripError::MissingField(_) | TripError::NegativePrice(_) | TripError::InvalidSearch(_) => {
                CoreError::Validation(err.to_string())
            }
        }
    }
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::TripUnavailable => CoreError::NotFound(err.to_string()),
            BookingError::Inventory(inner) => inner.into(),
            BookingError::OwnTrip | BookingError::NotTripDriver => CoreError::Forbidden(err.to_string()),
            BookingError::AlreadyProcessed(_)
            | BookingError::TripClosed(_)
            | BookingError::SeatsExhausted { .. } => CoreError::Conflict(err.to_string()),
            BookingError::PriceOverflow { .. } | BookingError::NotConfirmed(_) => {
                CoreError::Validation(err.to_string())
            }
            BookingError::UnknownStatus(_) => CoreError::Internal(err.to_string()),
        }
    }
}

impl From<ReviewError> for CoreError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::RatingOutOfRange(_) | ReviewError::SelfReview => CoreError::Validation(err.to_string()),
            ReviewError::NotParticipant | ReviewError::NotAuthor => CoreError::Forbidden(err.to_string()),
            ReviewError::Duplicate => CoreError::Conflict(err.to_string()),
        }
    }
}

impl From<IdentityError> for CoreError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => CoreError::Conflict(err.to_string()),
            _ => CoreError::Validation(err.to_string()),
        }
    }
}

impl From<UnknownRole> for CoreError {
    fn from(err: UnknownRole) -> Self {
        CoreError::Internal(err.to_string())
    }
}
