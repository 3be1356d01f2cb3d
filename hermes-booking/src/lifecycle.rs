//! Booking lifecycle rules.
//!
//! Storage backends load the rows involved (inside their transaction), ask
//! these functions what should happen, then write the outcome. Keeping the
//! decisions here means every backend enforces the same state machine and
//! the same seat checks.

use chrono::{DateTime, Utc};
use hermes_catalog::{InventoryError, Trip, TripStatus};
use uuid::Uuid;

use crate::models::{Booking, BookingDecision, BookingError, BookingStatus};

/// A validated, not yet stored, pending booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub trip_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_booked: i32,
    pub total_price: i32,
}

impl NewBooking {
    pub fn into_booking(self, now: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            passenger_id: self.passenger_id,
            seats_booked: self.seats_booked,
            total_price: self.total_price,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a driver decision that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPlan {
    pub status: BookingStatus,
    /// Seats to take from the trip; zero when rejecting.
    pub seats_to_reserve: i32,
    /// `available_seats` the trip must end up with.
    pub available_after: i32,
}

/// Price snapshot for `seats` at `price` per seat.
pub fn quote_total(price: i32, seats: i32) -> Result<i32, BookingError> {
    price
        .checked_mul(seats)
        .ok_or(BookingError::PriceOverflow { price, seats })
}

/// Validate a booking request against the trip as it is now.
///
/// Seats are checked but not taken: a pending booking holds no capacity.
pub fn plan_booking(trip: &Trip, passenger_id: Uuid, seats_requested: i32) -> Result<NewBooking, BookingError> {
    if trip.status != TripStatus::Active {
        return Err(BookingError::TripUnavailable);
    }
    if trip.driver_id == passenger_id {
        return Err(BookingError::OwnTrip);
    }
    trip.inventory()?.ensure_available(seats_requested)?;

    Ok(NewBooking {
        trip_id: trip.id,
        passenger_id,
        seats_booked: seats_requested,
        total_price: quote_total(trip.price, seats_requested)?,
    })
}

/// Validate a driver's decision on a booking.
///
/// `trip` must be the booking's trip, read in the same transaction that
/// will apply the plan. Confirmation re-checks capacity against the current
/// counter, not the one seen when the booking was created.
pub fn plan_decision(
    booking: &Booking,
    trip: &Trip,
    decider_id: Uuid,
    decision: BookingDecision,
) -> Result<DecisionPlan, BookingError> {
    if trip.driver_id != decider_id {
        return Err(BookingError::NotTripDriver);
    }
    let status = booking.status.apply(decision)?;

    match decision {
        BookingDecision::Reject => Ok(DecisionPlan {
            status,
            seats_to_reserve: 0,
            available_after: trip.available_seats,
        }),
        BookingDecision::Confirm => {
            if trip.status != TripStatus::Active {
                return Err(BookingError::TripClosed(trip.status));
            }
            let after = trip
                .inventory()?
                .reserve(booking.seats_booked)
                .map_err(|err| match err {
                    InventoryError::InsufficientSeats { requested, available } => {
                        BookingError::SeatsExhausted { requested, available }
                    }
                    other => BookingError::Inventory(other),
                })?;
            Ok(DecisionPlan {
                status,
                seats_to_reserve: booking.seats_booked,
                available_after: after.available_seats(),
            })
        }
    }
}

/// Driver-side rating of a booking: returns the passenger to rate.
pub fn passenger_to_rate(booking: &Booking, trip: &Trip, requester: Uuid) -> Result<Uuid, BookingError> {
    if trip.driver_id != requester {
        return Err(BookingError::NotTripDriver);
    }
    if booking.status != BookingStatus::Confirmed {
        return Err(BookingError::NotConfirmed(booking.status));
    }
    Ok(booking.passenger_id)
}
