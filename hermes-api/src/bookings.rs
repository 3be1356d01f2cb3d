use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use hermes_booking::{passenger_to_rate, Booking, BookingDecision, BookingRequest, DriverBooking, PassengerBooking};
use hermes_core::CoreError;
use hermes_review::{NewReview, Review, ReviewEdit};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiJson, ApiPath, AppError},
    middleware::Claims,
    state::AppState,
};

/// `PATCH /bookings/{id}/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: BookingDecision,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/my-bookings", get(my_bookings))
        .route("/bookings/driver", get(driver_bookings))
        .route("/bookings/{id}/status", patch(update_status))
        .route("/bookings/{id}/rate", post(rate_passenger))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings.create_booking(claims.sub, req).await?;
    info!(
        "Booking {} requested by {} on trip {} ({} seats)",
        booking.id, booking.passenger_id, booking.trip_id, booking.seats_booked
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PassengerBooking>>, AppError> {
    Ok(Json(state.bookings.list_passenger_bookings(claims.sub).await?))
}

async fn driver_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DriverBooking>>, AppError> {
    Ok(Json(state.bookings.list_driver_bookings(claims.sub).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StatusUpdate>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.decide_booking(id, claims.sub, req.status).await?))
}

/// Driver rates the passenger of one of their confirmed bookings.
async fn rate_passenger(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReviewEdit>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let booking = state.bookings.get_booking(id).await?;
    let trip = state.trips.get_trip(booking.trip_id).await?;
    let passenger_id = passenger_to_rate(&booking, &trip, claims.sub).map_err(CoreError::from)?;

    let review = NewReview::new(trip.id, claims.sub, passenger_id, req.rating, req.comment)
        .map_err(CoreError::from)?;
    let review = state.reviews.submit_review(review).await?;

    info!("Driver {} rated passenger {} on booking {}", claims.sub, passenger_id, id);
    Ok((StatusCode::CREATED, Json(review)))
}
