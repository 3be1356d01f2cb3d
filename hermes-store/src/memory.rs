//! Process-local repositories for the `memory` backend and tests.
//!
//! All state sits behind one async mutex and every operation holds it for
//! its whole read-check-write sequence, which gives each call the same
//! all-or-nothing behavior as a Postgres transaction.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use hermes_booking::{
    plan_booking, plan_decision, BookedTrip, Booking, BookingDecision, BookingError, BookingRequest,
    BookingStatus, DriverBooking, PassengerBooking, TripBrief,
};
use hermes_catalog::{describe_car, DriverSummary, SearchFilter, Trip, TripDetails, TripListing, TripStatus};
use hermes_core::identity::{IdentityError, NewUser, ProfileUpdate, User, UserCredentials};
use hermes_core::repository::{
    BookingRepository, ReviewRepository, TripCancellation, TripRepository, UserRepository,
};
use hermes_core::{CoreError, CoreResult};
use hermes_review::{check_participation, NewReview, Rating, RatingSummary, Review, ReviewError, ReviewView};
use hermes_shared::Masked;

struct StoredUser {
    user: User,
    password_hash: Masked<String>,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, StoredUser>,
    trips: HashMap<Uuid, Trip>,
    bookings: HashMap<Uuid, Booking>,
    reviews: HashMap<Uuid, Review>,
}

impl State {
    fn user(&self, id: Uuid) -> CoreResult<&User> {
        self.users
            .get(&id)
            .map(|stored| &stored.user)
            .ok_or_else(|| CoreError::not_found("User"))
    }

    fn trip(&self, id: Uuid) -> CoreResult<&Trip> {
        self.trips.get(&id).ok_or_else(|| CoreError::not_found("Trip"))
    }

    fn driver_summary(&self, trip: &Trip) -> CoreResult<(DriverSummary, Masked<String>)> {
        let driver = self.user(trip.driver_id)?;
        let summary = DriverSummary {
            driver_name: driver.full_name.clone(),
            driver_rating: driver.rating,
            driver_car: describe_car(driver.car.car_brand.as_deref(), driver.car.car_model.as_deref()),
        };
        Ok((summary, driver.phone.clone()))
    }

    fn review_view(&self, review: &Review) -> CoreResult<ReviewView> {
        let author = self.user(review.author_id)?;
        let target = self.user(review.target_id)?;
        let trip = self.trip(review.trip_id)?;
        Ok(ReviewView {
            review: review.clone(),
            author_name: author.full_name.clone(),
            author_avatar: author.avatar_url.clone(),
            target_name: target.full_name.clone(),
            target_avatar: target.avatar_url.clone(),
            from_city: trip.from_city.clone(),
            to_city: trip.to_city.clone(),
            trip_date: trip.trip_date,
        })
    }

    fn recompute_rating(&mut self, target_id: Uuid) -> CoreResult<RatingSummary> {
        let summary = RatingSummary::from_ratings(
            self.reviews
                .values()
                .filter(|r| r.target_id == target_id)
                .map(|r| r.rating),
        );
        let stored = self
            .users
            .get_mut(&target_id)
            .ok_or_else(|| CoreError::not_found("User"))?;
        stored.user.rating = summary.rating;
        stored.user.reviews_count = summary.reviews_count;
        stored.user.updated_at = Utc::now();
        Ok(summary)
    }
}

/// In-memory implementation of every repository trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        let taken = state
            .users
            .values()
            .any(|stored| stored.user.email.expose() == new_user.email.expose());
        if taken {
            return Err(IdentityError::EmailTaken.into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            email: new_user.email,
            phone: new_user.phone,
            role: new_user.role,
            avatar_url: None,
            car: Default::default(),
            rating: 0.0,
            reviews_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.email.expose() == email)
            .map(|stored| UserCredentials {
                id: stored.user.id,
                full_name: stored.user.full_name.clone(),
                email: stored.user.email.clone(),
                role: stored.user.role,
                password_hash: stored.password_hash.clone(),
                rating: stored.user.rating,
                reviews_count: stored.user.reviews_count,
            }))
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<User> {
        let state = self.state.lock().await;
        state.user(id).cloned()
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        let stored = state.users.get_mut(&id).ok_or_else(|| CoreError::not_found("User"))?;
        stored.user.full_name = update.full_name;
        stored.user.phone = update.phone;
        stored.user.car = update.car;
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl TripRepository for InMemoryStore {
    async fn create_trip(&self, trip: Trip) -> CoreResult<Trip> {
        let mut state = self.state.lock().await;
        state.user(trip.driver_id)?;
        state.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    async fn get_trip(&self, id: Uuid) -> CoreResult<Trip> {
        let state = self.state.lock().await;
        state.trip(id).cloned()
    }

    async fn get_trip_details(&self, id: Uuid) -> CoreResult<TripDetails> {
        let state = self.state.lock().await;
        let trip = state.trip(id)?;
        let (driver, phone) = state.driver_summary(trip)?;
        Ok(TripDetails {
            trip: trip.clone(),
            driver,
            phone: Some(phone),
        })
    }

    async fn search_trips(&self, filter: &SearchFilter) -> CoreResult<Vec<TripListing>> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Trip> = state.trips.values().filter(|t| filter.matches(t)).collect();
        matching.sort_by_key(|t| (t.trip_date, t.trip_time, t.created_at));

        let offset = usize::try_from(filter.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|trip| -> CoreResult<TripListing> {
                let (driver, _) = state.driver_summary(trip)?;
                Ok(TripListing {
                    trip: trip.clone(),
                    driver,
                })
            })
            .collect()
    }

    async fn list_driver_trips(&self, driver_id: Uuid) -> CoreResult<Vec<Trip>> {
        let state = self.state.lock().await;
        let mut trips: Vec<Trip> = state
            .trips
            .values()
            .filter(|t| t.driver_id == driver_id)
            .cloned()
            .collect();
        trips.sort_by_key(|t| Reverse((t.trip_date, t.trip_time)));
        Ok(trips)
    }

    async fn list_booked_trips(&self, passenger_id: Uuid) -> CoreResult<Vec<BookedTrip>> {
        let state = self.state.lock().await;
        let mut booked = state
            .bookings
            .values()
            .filter(|b| b.passenger_id == passenger_id)
            .map(|b| -> CoreResult<BookedTrip> {
                Ok(BookedTrip {
                    trip: state.trip(b.trip_id)?.clone(),
                    booking_id: b.id,
                    seats_booked: b.seats_booked,
                    booking_status: b.status,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        booked.sort_by_key(|bt| Reverse((bt.trip.trip_date, bt.trip.trip_time)));
        Ok(booked)
    }

    async fn cancel_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<TripCancellation> {
        let mut state = self.state.lock().await;
        let status = state.trip(trip_id)?.plan_transition(requester, TripStatus::Cancelled)?;

        let now = Utc::now();
        let mut cancelled_bookings = 0;
        for booking in state.bookings.values_mut().filter(|b| b.trip_id == trip_id) {
            if booking.cancel_with_trip(now) {
                cancelled_bookings += 1;
            }
        }

        let trip = state.trips.get_mut(&trip_id).ok_or_else(|| CoreError::not_found("Trip"))?;
        trip.status = status;
        trip.updated_at = now;

        info!("Trip {} cancelled, {} pending bookings cancelled", trip_id, cancelled_bookings);
        Ok(TripCancellation {
            trip: trip.clone(),
            cancelled_bookings,
        })
    }

    async fn complete_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<Trip> {
        let mut state = self.state.lock().await;
        let status = state.trip(trip_id)?.plan_transition(requester, TripStatus::Completed)?;
        let trip = state.trips.get_mut(&trip_id).ok_or_else(|| CoreError::not_found("Trip"))?;
        trip.status = status;
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn create_booking(&self, passenger_id: Uuid, request: BookingRequest) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        let trip = state
            .trips
            .get(&request.trip_id)
            .ok_or(BookingError::TripUnavailable)?;
        let booking = plan_booking(trip, passenger_id, request.seats_booked)?.into_booking(Utc::now());
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn decide_booking(
        &self,
        booking_id: Uuid,
        decider_id: Uuid,
        decision: BookingDecision,
    ) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or_else(|| CoreError::not_found("Booking"))?;
        let trip = state.trip(booking.trip_id)?;
        let plan = plan_decision(booking, trip, decider_id, decision)?;
        let trip_id = trip.id;

        let now = Utc::now();
        if plan.seats_to_reserve > 0 {
            let trip = state.trips.get_mut(&trip_id).ok_or_else(|| CoreError::not_found("Trip"))?;
            trip.available_seats = plan.available_after;
            trip.updated_at = now;
        }
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| CoreError::not_found("Booking"))?;
        booking.set_status(plan.status, now);

        info!(
            "Booking {} on trip {} -> {} ({} seats left)",
            booking_id, trip_id, plan.status, plan.available_after
        );
        Ok(booking.clone())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        let state = self.state.lock().await;
        state
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Booking"))
    }

    async fn list_passenger_bookings(&self, passenger_id: Uuid) -> CoreResult<Vec<PassengerBooking>> {
        let state = self.state.lock().await;
        let mut bookings = state
            .bookings
            .values()
            .filter(|b| b.passenger_id == passenger_id)
            .map(|b| -> CoreResult<PassengerBooking> {
                let trip = state.trip(b.trip_id)?;
                Ok(PassengerBooking {
                    booking: b.clone(),
                    trip: TripBrief::from(trip),
                    driver_name: state.user(trip.driver_id)?.full_name.clone(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        bookings.sort_by_key(|pb| Reverse(pb.booking.created_at));
        Ok(bookings)
    }

    async fn list_driver_bookings(&self, driver_id: Uuid) -> CoreResult<Vec<DriverBooking>> {
        let state = self.state.lock().await;
        let mut bookings = Vec::new();
        for booking in state.bookings.values() {
            let trip = state.trip(booking.trip_id)?;
            if trip.driver_id != driver_id {
                continue;
            }
            let passenger = state.user(booking.passenger_id)?;
            bookings.push(DriverBooking {
                booking: booking.clone(),
                trip: TripBrief::from(trip),
                passenger_name: passenger.full_name.clone(),
                passenger_phone: Some(passenger.phone.clone()),
            });
        }
        bookings.sort_by_key(|entry| (entry.booking.status.inbox_rank(), Reverse(entry.booking.created_at)));
        Ok(bookings)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn submit_review(&self, review: NewReview) -> CoreResult<Review> {
        let mut state = self.state.lock().await;
        let driver_id = state.trip(review.trip_id)?.driver_id;
        let confirmed: Vec<Uuid> = state
            .bookings
            .values()
            .filter(|b| b.trip_id == review.trip_id && b.status == BookingStatus::Confirmed)
            .map(|b| b.passenger_id)
            .collect();
        check_participation(driver_id, review.author_id, review.target_id, &confirmed)?;

        let duplicate = state.reviews.values().any(|r| {
            r.trip_id == review.trip_id && r.author_id == review.author_id && r.target_id == review.target_id
        });
        if duplicate {
            return Err(ReviewError::Duplicate.into());
        }

        let review = review.into_review(Utc::now());
        state.reviews.insert(review.id, review.clone());
        let summary = state.recompute_rating(review.target_id)?;

        info!(
            "Review {} on trip {} for user {} (rating now {:.2} over {})",
            review.id, review.trip_id, review.target_id, summary.rating, summary.reviews_count
        );
        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        author_id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> CoreResult<Review> {
        let mut state = self.state.lock().await;
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| CoreError::not_found("Review"))?;
        review.ensure_author(author_id)?;
        review.edit(rating, comment, Utc::now());
        let review = review.clone();
        state.recompute_rating(review.target_id)?;
        Ok(review)
    }

    async fn list_reviews_for(&self, target_id: Uuid) -> CoreResult<Vec<ReviewView>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<&Review> = state.reviews.values().filter(|r| r.target_id == target_id).collect();
        reviews.sort_by_key(|r| Reverse(r.created_at));
        reviews.into_iter().map(|r| state.review_view(r)).collect()
    }

    async fn list_reviews_by(&self, author_id: Uuid) -> CoreResult<Vec<ReviewView>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<&Review> = state.reviews.values().filter(|r| r.author_id == author_id).collect();
        reviews.sort_by_key(|r| Reverse(r.created_at));
        reviews.into_iter().map(|r| state.review_view(r)).collect()
    }

    async fn find_review(&self, trip_id: Uuid, author_id: Uuid) -> CoreResult<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .values()
            .filter(|r| r.trip_id == trip_id && r.author_id == author_id)
            .min_by_key(|r| r.created_at)
            .cloned())
    }
}
