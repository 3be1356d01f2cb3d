use serde::{Deserialize, Serialize};

/// Upper bound for both a trip's capacity and a single booking.
pub const MAX_SEATS: i32 = 8;

/// Seat counters of a single trip.
///
/// `available_seats` starts equal to `seats` and is only lowered when a
/// booking is confirmed. Every constructor and mutation keeps
/// `0 <= available_seats <= seats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInventory {
    seats: i32,
    available_seats: i32,
}

impl SeatInventory {
    /// Rebuild from stored counters, rejecting rows that break the invariant.
    pub fn from_counters(seats: i32, available_seats: i32) -> Result<Self, InventoryError> {
        if available_seats < 0 || available_seats > seats {
            return Err(InventoryError::InvalidCounters {
                seats,
                available: available_seats,
            });
        }
        Ok(Self {
            seats,
            available_seats,
        })
    }

    pub fn available_seats(&self) -> i32 {
        self.available_seats
    }

    /// Check that `requested` seats could be taken right now.
    pub fn ensure_available(&self, requested: i32) -> Result<(), InventoryError> {
        validate_seat_count(requested)?;
        if requested > self.available_seats {
            return Err(InventoryError::InsufficientSeats {
                requested,
                available: self.available_seats,
            });
        }
        Ok(())
    }

    /// Take `requested` seats out of the available pool.
    pub fn reserve(self, requested: i32) -> Result<Self, InventoryError> {
        self.ensure_available(requested)?;
        Ok(Self {
            seats: self.seats,
            available_seats: self.available_seats - requested,
        })
    }
}

/// Seat counts, for trips and for bookings, must be in `1..=MAX_SEATS`.
pub fn validate_seat_count(count: i32) -> Result<(), InventoryError> {
    if (1..=MAX_SEATS).contains(&count) {
        Ok(())
    } else {
        Err(InventoryError::SeatCountOutOfRange(count))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Seat count must be between 1 and {max}, got {0}", max = MAX_SEATS)]
    SeatCountOutOfRange(i32),

    #[error("Not enough available seats: requested {requested}, available {available}")]
    InsufficientSeats {
        requested: i32,
        available: i32,
    },

    #[error("Inconsistent seat counters: {available} available out of {seats}")]
    InvalidCounters {
        seats: i32,
        available: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_lifecycle() {
        let inventory = SeatInventory::from_counters(3, 3).unwrap();
        assert_eq!(inventory.available_seats(), 3);

        let inventory = inventory.reserve(2).unwrap();
        assert_eq!(inventory.available_seats(), 1);

        let err = inventory.reserve(2).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientSeats {
                requested: 2,
                available: 1
            }
        );

        let inventory = inventory.reserve(1).unwrap();
        assert_eq!(inventory.available_seats(), 0);
        assert!(inventory.ensure_available(1).is_err());
    }

    #[test]
    fn test_seat_count_bounds() {
        assert!(validate_seat_count(1).is_ok());
        assert!(validate_seat_count(MAX_SEATS).is_ok());
        assert_eq!(
            validate_seat_count(0),
            Err(InventoryError::SeatCountOutOfRange(0))
        );
        assert!(validate_seat_count(MAX_SEATS + 1).is_err());
    }

    #[test]
    fn test_from_counters_rejects_broken_rows() {
        assert!(SeatInventory::from_counters(4, 4).is_ok());
        assert!(SeatInventory::from_counters(4, 0).is_ok());
        assert!(SeatInventory::from_counters(4, 5).is_err());
        assert!(SeatInventory::from_counters(4, -1).is_err());
    }
}
