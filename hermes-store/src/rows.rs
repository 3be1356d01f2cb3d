//! Row types shared by the Postgres repositories and their conversions into
//! domain types. Statuses and roles are stored as text and parsed here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hermes_booking::{BookedTrip, Booking, BookingStatus, DriverBooking, PassengerBooking, TripBrief};
use hermes_catalog::{describe_car, Amenities, DriverSummary, Trip, TripDetails, TripListing, TripStatus};
use hermes_core::identity::{CarDetails, User, UserCredentials};
use hermes_core::{CoreError, CoreResult};
use hermes_review::{Review, ReviewView};
use hermes_shared::{Masked, Role};
use uuid::Uuid;

pub(crate) const TRIP_COLUMNS: &str = "t.id, t.driver_id, t.from_city, t.to_city, t.trip_date, t.trip_time, \
     t.price, t.seats, t.available_seats, t.description, t.no_smoking, t.animals_allowed, \
     t.music_allowed, t.status, t.created_at, t.updated_at";

pub(crate) const BOOKING_COLUMNS: &str = "b.id, b.trip_id, b.passenger_id, b.seats_booked, b.total_price, \
     b.status, b.created_at, b.updated_at";

pub(crate) const USER_COLUMNS: &str = "id, full_name, email, phone, role, avatar_url, car_brand, car_model, \
     car_year, car_color, car_number, rating, reviews_count, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str = "r.id, r.trip_id, r.author_id, r.target_id, r.rating, r.comment, \
     r.created_at, r.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct TripRow {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
    pub trip_time: NaiveTime,
    pub price: i32,
    pub seats: i32,
    pub available_seats: i32,
    pub description: Option<String>,
    pub no_smoking: bool,
    pub animals_allowed: bool,
    pub music_allowed: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = CoreError;

    fn try_from(row: TripRow) -> CoreResult<Self> {
        Ok(Trip {
            id: row.id,
            driver_id: row.driver_id,
            from_city: row.from_city,
            to_city: row.to_city,
            trip_date: row.trip_date,
            trip_time: row.trip_time,
            price: row.price,
            seats: row.seats,
            available_seats: row.available_seats,
            description: row.description,
            amenities: Amenities {
                no_smoking: row.no_smoking,
                animals_allowed: row.animals_allowed,
                music_allowed: row.music_allowed,
            },
            status: row.status.parse::<TripStatus>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Trip joined with its driver.
#[derive(sqlx::FromRow)]
pub(crate) struct TripDriverRow {
    #[sqlx(flatten)]
    pub trip: TripRow,
    pub driver_name: String,
    pub driver_rating: f64,
    pub car_brand: Option<String>,
    pub car_model: Option<String>,
    pub driver_phone: String,
}

impl TripDriverRow {
    fn split(self) -> CoreResult<(Trip, DriverSummary, String)> {
        let driver = DriverSummary {
            driver_name: self.driver_name,
            driver_rating: self.driver_rating,
            driver_car: describe_car(self.car_brand.as_deref(), self.car_model.as_deref()),
        };
        Ok((self.trip.try_into()?, driver, self.driver_phone))
    }

    pub fn into_listing(self) -> CoreResult<TripListing> {
        let (trip, driver, _) = self.split()?;
        Ok(TripListing { trip, driver })
    }

    pub fn into_details(self) -> CoreResult<TripDetails> {
        let (trip, driver, phone) = self.split()?;
        Ok(TripDetails {
            trip,
            driver,
            phone: Some(Masked(phone)),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookedTripRow {
    #[sqlx(flatten)]
    pub trip: TripRow,
    pub booking_id: Uuid,
    pub seats_booked: i32,
    pub booking_status: String,
}

impl TryFrom<BookedTripRow> for BookedTrip {
    type Error = CoreError;

    fn try_from(row: BookedTripRow) -> CoreResult<Self> {
        Ok(BookedTrip {
            trip: row.trip.try_into()?,
            booking_id: row.booking_id,
            seats_booked: row.seats_booked,
            booking_status: row.booking_status.parse::<BookingStatus>()?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_booked: i32,
    pub total_price: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> CoreResult<Self> {
        Ok(Booking {
            id: row.id,
            trip_id: row.trip_id,
            passenger_id: row.passenger_id,
            seats_booked: row.seats_booked,
            total_price: row.total_price,
            status: row.status.parse::<BookingStatus>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Booking joined with its trip's route and the other party.
#[derive(sqlx::FromRow)]
pub(crate) struct BookingViewRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
    pub trip_time: NaiveTime,
    pub trip_status: String,
    pub party_name: String,
    pub party_phone: String,
}

impl BookingViewRow {
    fn split(self) -> CoreResult<(Booking, TripBrief, String, String)> {
        let trip = TripBrief {
            from_city: self.from_city,
            to_city: self.to_city,
            trip_date: self.trip_date,
            trip_time: self.trip_time,
            trip_status: self.trip_status.parse::<TripStatus>()?,
        };
        Ok((self.booking.try_into()?, trip, self.party_name, self.party_phone))
    }

    pub fn into_passenger_view(self) -> CoreResult<PassengerBooking> {
        let (booking, trip, driver_name, _) = self.split()?;
        Ok(PassengerBooking {
            booking,
            trip,
            driver_name,
        })
    }

    pub fn into_driver_view(self) -> CoreResult<DriverBooking> {
        let (booking, trip, passenger_name, phone) = self.split()?;
        Ok(DriverBooking {
            booking,
            trip,
            passenger_name,
            passenger_phone: Some(Masked(phone)),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub car_brand: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub car_color: Option<String>,
    pub car_number: Option<String>,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> CoreResult<Self> {
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: Masked(row.email),
            phone: Masked(row.phone),
            role: row.role.parse::<Role>()?,
            avatar_url: row.avatar_url,
            car: CarDetails {
                car_brand: row.car_brand,
                car_model: row.car_model,
                car_year: row.car_year,
                car_color: row.car_color,
                car_number: row.car_number,
            },
            rating: row.rating,
            reviews_count: row.reviews_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CredentialsRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub rating: f64,
    pub reviews_count: i32,
}

impl TryFrom<CredentialsRow> for UserCredentials {
    type Error = CoreError;

    fn try_from(row: CredentialsRow) -> CoreResult<Self> {
        Ok(UserCredentials {
            id: row.id,
            full_name: row.full_name,
            email: Masked(row.email),
            role: row.role.parse::<Role>()?,
            password_hash: Masked(row.password_hash),
            rating: row.rating,
            reviews_count: row.reviews_count,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub target_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            trip_id: row.trip_id,
            author_id: row.author_id,
            target_id: row.target_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReviewViewRow {
    #[sqlx(flatten)]
    pub review: ReviewRow,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub target_name: String,
    pub target_avatar: Option<String>,
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
}

impl From<ReviewViewRow> for ReviewView {
    fn from(row: ReviewViewRow) -> Self {
        ReviewView {
            review: row.review.into(),
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            target_name: row.target_name,
            target_avatar: row.target_avatar,
            from_city: row.from_city,
            to_city: row.to_city,
            trip_date: row.trip_date,
        }
    }
}

/// Collect rows through a fallible conversion.
pub(crate) fn convert_all<R, T>(rows: Vec<R>, f: impl Fn(R) -> CoreResult<T>) -> CoreResult<Vec<T>> {
    rows.into_iter().map(f).collect()
}
