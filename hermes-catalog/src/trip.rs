use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::inventory::{validate_seat_count, InventoryError, SeatInventory};

/// Trip status in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Active,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Active => "active",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TripStatus::Active)
    }

    /// Active → Completed | Cancelled. Nothing leaves a terminal state.
    pub fn transition(self, to: TripStatus) -> Result<TripStatus, TripError> {
        if self.is_terminal() || !to.is_terminal() {
            return Err(TripError::InvalidTransition { from: self, to });
        }
        Ok(to)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TripStatus::Active),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(TripError::UnknownStatus(other.to_string())),
        }
    }
}

/// Ride conditions set by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Amenities {
    pub no_smoking: bool,
    pub animals_allowed: bool,
    pub music_allowed: bool,
}

/// A driver-published ride offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub trip_time: NaiveTime,
    pub price: i32,
    pub seats: i32,
    pub available_seats: i32,
    pub description: Option<String>,
    #[serde(flatten)]
    pub amenities: Amenities,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Build a trip from an already validated request.
    pub fn publish(driver_id: Uuid, new_trip: NewTrip, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            from_city: new_trip.from_city,
            to_city: new_trip.to_city,
            trip_date: new_trip.trip_date,
            trip_time: new_trip.trip_time,
            price: new_trip.price,
            seats: new_trip.seats,
            available_seats: new_trip.seats,
            description: new_trip.description,
            amenities: new_trip.amenities,
            status: TripStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn inventory(&self) -> Result<SeatInventory, InventoryError> {
        SeatInventory::from_counters(self.seats, self.available_seats)
    }

    pub fn ensure_owner(&self, user_id: Uuid) -> Result<(), TripError> {
        if self.driver_id == user_id {
            Ok(())
        } else {
            Err(TripError::NotOwner)
        }
    }

    /// Owner-only status change, guarded by the lifecycle.
    pub fn plan_transition(&self, requester: Uuid, to: TripStatus) -> Result<TripStatus, TripError> {
        self.ensure_owner(requester)?;
        self.status.transition(to)
    }
}

/// Request body for publishing a trip.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub trip_time: NaiveTime,
    pub price: i32,
    pub seats: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub amenities: Amenities,
}

impl NewTrip {
    /// Trim free text and check capacity and price.
    pub fn validate(mut self) -> Result<Self, TripError> {
        self.from_city = self.from_city.trim().to_string();
        self.to_city = self.to_city.trim().to_string();
        if self.from_city.is_empty() {
            return Err(TripError::MissingField("fromCity"));
        }
        if self.to_city.is_empty() {
            return Err(TripError::MissingField("toCity"));
        }
        validate_seat_count(self.seats)?;
        if self.price < 0 {
            return Err(TripError::NegativePrice(self.price));
        }
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(self)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TripError {
    #[error("Field {0} is required")]
    MissingField(&'static str),

    #[error("Price must not be negative, got {0}")]
    NegativePrice(i32),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("Invalid search parameter: {0}")]
    InvalidSearch(String),

    #[error("Only drivers can create trips")]
    DriverRoleRequired,

    #[error("You are not the owner of this trip")]
    NotOwner,

    #[error("Trip cannot move from {from} to {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },

    #[error("Unknown trip status: {0}")]
    UnknownStatus(String),
}

/// `HH:MM` on the wire; `HH:MM:SS` is accepted on input as well.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(raw, FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_trip_json() -> serde_json::Value {
        serde_json::json!({
            "fromCity": "  Moscow ",
            "toCity": "Tver",
            "tripDate": "2026-11-02",
            "tripTime": "08:30",
            "price": 100,
            "seats": 3,
            "noSmoking": true
        })
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            TripStatus::Active.transition(TripStatus::Cancelled),
            Ok(TripStatus::Cancelled)
        );
        assert_eq!(
            TripStatus::Active.transition(TripStatus::Completed),
            Ok(TripStatus::Completed)
        );
        assert!(TripStatus::Active.transition(TripStatus::Active).is_err());
        assert!(!TripStatus::Active.is_terminal());
        for terminal in [TripStatus::Completed, TripStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for to in [TripStatus::Active, TripStatus::Completed, TripStatus::Cancelled] {
                assert!(terminal.transition(to).is_err());
            }
        }
    }

    #[test]
    fn test_new_trip_deserialization_and_validation() {
        let new_trip: NewTrip = serde_json::from_value(new_trip_json()).expect("Failed to deserialize");
        assert_eq!(new_trip.trip_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(new_trip.amenities.no_smoking);
        assert!(!new_trip.amenities.music_allowed);

        let valid = new_trip.validate().unwrap();
        assert_eq!(valid.from_city, "Moscow");
        assert_eq!(valid.description, None);
    }

    #[test]
    fn test_new_trip_rejects_bad_input() {
        let mut json = new_trip_json();
        json["seats"] = serde_json::json!(9);
        let new_trip: NewTrip = serde_json::from_value(json).unwrap();
        assert!(matches!(new_trip.validate(), Err(TripError::Inventory(_))));

        let mut json = new_trip_json();
        json["price"] = serde_json::json!(-1);
        let new_trip: NewTrip = serde_json::from_value(json).unwrap();
        assert_eq!(new_trip.validate().unwrap_err(), TripError::NegativePrice(-1));

        let mut json = new_trip_json();
        json["toCity"] = serde_json::json!("   ");
        let new_trip: NewTrip = serde_json::from_value(json).unwrap();
        assert_eq!(new_trip.validate().unwrap_err(), TripError::MissingField("toCity"));
    }

    #[test]
    fn test_only_owner_may_change_status() {
        let driver = Uuid::new_v4();
        let new_trip: NewTrip = serde_json::from_value(new_trip_json()).unwrap();
        let trip = Trip::publish(driver, new_trip.validate().unwrap(), Utc::now());

        assert_eq!(trip.available_seats, 3);
        assert_eq!(trip.plan_transition(Uuid::new_v4(), TripStatus::Cancelled), Err(TripError::NotOwner));
        assert_eq!(trip.plan_transition(driver, TripStatus::Cancelled), Ok(TripStatus::Cancelled));
    }

    #[test]
    fn test_trip_serializes_time_as_hours_and_minutes() {
        let new_trip: NewTrip = serde_json::from_value(new_trip_json()).unwrap();
        let trip = Trip::publish(Uuid::new_v4(), new_trip.validate().unwrap(), Utc::now());
        let json = serde_json::to_value(&trip).unwrap();
        assert_eq!(json["tripTime"], "08:30");
        assert_eq!(json["tripDate"], "2026-11-02");
        assert_eq!(json["availableSeats"], 3);
        assert_eq!(json["noSmoking"], true);
        assert_eq!(json["status"], "active");
    }
}
