use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hermes_catalog::{InventoryError, Trip, TripStatus};
use hermes_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Pending → Confirmed | Cancelled. Both outcomes are final.
    pub fn apply(self, decision: BookingDecision) -> Result<BookingStatus, BookingError> {
        match self {
            BookingStatus::Pending => Ok(decision.target_status()),
            BookingStatus::Confirmed | BookingStatus::Cancelled => {
                Err(BookingError::AlreadyProcessed(self))
            }
        }
    }

    /// Sort position in the driver's inbox: pending, then confirmed, then cancelled.
    pub fn inbox_rank(&self) -> u8 {
        match self {
            BookingStatus::Pending => 1,
            BookingStatus::Confirmed => 2,
            BookingStatus::Cancelled => 3,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::UnknownStatus(other.to_string())),
        }
    }
}

/// The driver's answer to a pending booking. Wire values match the
/// resulting status: `"confirmed"` or `"cancelled"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingDecision {
    #[serde(rename = "confirmed")]
    Confirm,
    #[serde(rename = "cancelled")]
    Reject,
}

impl BookingDecision {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            BookingDecision::Confirm => BookingStatus::Confirmed,
            BookingDecision::Reject => BookingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_booked: i32,
    /// Trip price × seats at creation time. Never re-derived.
    pub total_price: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn set_status(&mut self, status: BookingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Trip cancellation cascade: pending bookings are cancelled, decided ones
    /// are left alone. Returns whether this booking changed.
    pub fn cancel_with_trip(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == BookingStatus::Pending {
            self.set_status(BookingStatus::Cancelled, now);
            true
        } else {
            false
        }
    }
}

/// `POST /bookings` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub trip_id: Uuid,
    pub seats_booked: i32,
}

/// Route and schedule of the trip a booking belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripBrief {
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
    #[serde(with = "hermes_catalog::trip::hhmm")]
    pub trip_time: NaiveTime,
    pub trip_status: TripStatus,
}

impl From<&Trip> for TripBrief {
    fn from(trip: &Trip) -> Self {
        Self {
            from_city: trip.from_city.clone(),
            to_city: trip.to_city.clone(),
            trip_date: trip.trip_date,
            trip_time: trip.trip_time,
            trip_status: trip.status,
        }
    }
}

/// A booking as the passenger sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(flatten)]
    pub trip: TripBrief,
    pub driver_name: String,
}

/// A booking request as the driver sees it, with the passenger's contact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(flatten)]
    pub trip: TripBrief,
    pub passenger_name: String,
    pub passenger_phone: Option<Masked<String>>,
}

/// A trip the caller booked, for the passenger side of "my trips".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedTrip {
    #[serde(flatten)]
    pub trip: Trip,
    pub booking_id: Uuid,
    pub seats_booked: i32,
    pub booking_status: BookingStatus,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Trip not found or not active")]
    TripUnavailable,

    #[error("You cannot book your own trip")]
    OwnTrip,

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("Total price overflows for {seats} seats at {price}")]
    PriceOverflow { price: i32, seats: i32 },

    #[error("You are not the driver of this trip")]
    NotTripDriver,

    #[error("Booking already processed (status: {0})")]
    AlreadyProcessed(BookingStatus),

    #[error("Trip is {0}, bookings can no longer be confirmed")]
    TripClosed(TripStatus),

    #[error("Not enough seats left to confirm: requested {requested}, available {available}")]
    SeatsExhausted { requested: i32, available: i32 },

    #[error("Can only rate confirmed bookings (status: {0})")]
    NotConfirmed(BookingStatus),

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}
