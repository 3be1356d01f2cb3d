use async_trait::async_trait;
use uuid::Uuid;

use hermes_booking::{BookedTrip, Booking, BookingDecision, BookingRequest, DriverBooking, PassengerBooking};
use hermes_catalog::{SearchFilter, Trip, TripDetails, TripListing};
use hermes_review::{NewReview, Rating, Review, ReviewView};

use crate::identity::{NewUser, ProfileUpdate, User, UserCredentials};
use crate::CoreResult;

/// Repository trait for user accounts and profiles
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn find_credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>>;

    async fn get_user(&self, id: Uuid) -> CoreResult<User>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User>;
}

/// Result of cancelling a trip.
#[derive(Debug, Clone)]
pub struct TripCancellation {
    pub trip: Trip,
    /// Pending bookings cancelled along with the trip.
    pub cancelled_bookings: u64,
}

/// Repository trait for the trip catalog
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: Trip) -> CoreResult<Trip>;

    async fn get_trip(&self, id: Uuid) -> CoreResult<Trip>;

    /// Trip with its driver, including the driver's phone.
    async fn get_trip_details(&self, id: Uuid) -> CoreResult<TripDetails>;

    async fn search_trips(&self, filter: &SearchFilter) -> CoreResult<Vec<TripListing>>;

    /// Trips published by `driver_id`, newest date first.
    async fn list_driver_trips(&self, driver_id: Uuid) -> CoreResult<Vec<Trip>>;

    /// Trips `passenger_id` booked, with the booking status, newest date first.
    async fn list_booked_trips(&self, passenger_id: Uuid) -> CoreResult<Vec<BookedTrip>>;

    /// Owner-only. Cancels the trip and its pending bookings atomically.
    async fn cancel_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<TripCancellation>;

    /// Owner-only.
    async fn complete_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<Trip>;
}

/// Repository trait for the booking lifecycle
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Creates a pending booking. Does not touch the trip's seat counter.
    async fn create_booking(&self, passenger_id: Uuid, request: BookingRequest) -> CoreResult<Booking>;

    /// Applies a driver decision. Confirmation takes the seats in the same
    /// atomic step, or fails without writing anything.
    async fn decide_booking(
        &self,
        booking_id: Uuid,
        decider_id: Uuid,
        decision: BookingDecision,
    ) -> CoreResult<Booking>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Booking>;

    /// Newest first.
    async fn list_passenger_bookings(&self, passenger_id: Uuid) -> CoreResult<Vec<PassengerBooking>>;

    /// Pending, then confirmed, then cancelled; newest first within each group.
    async fn list_driver_bookings(&self, driver_id: Uuid) -> CoreResult<Vec<DriverBooking>>;
}

/// Repository trait for reviews and the rating aggregate
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Checks participation, inserts the review and recomputes the target's
    /// rating in one transaction.
    async fn submit_review(&self, review: NewReview) -> CoreResult<Review>;

    /// Author-only. Recomputes the target's rating in the same transaction.
    async fn update_review(
        &self,
        review_id: Uuid,
        author_id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> CoreResult<Review>;

    /// Reviews about `target_id`, newest first.
    async fn list_reviews_for(&self, target_id: Uuid) -> CoreResult<Vec<ReviewView>>;

    /// Reviews written by `author_id`, newest first.
    async fn list_reviews_by(&self, author_id: Uuid) -> CoreResult<Vec<ReviewView>>;

    async fn find_review(&self, trip_id: Uuid, author_id: Uuid) -> CoreResult<Option<Review>>;
}
