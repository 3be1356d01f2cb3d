use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use hermes_booking::BookedTrip;
use hermes_catalog::{NewTrip, Trip, TripDetails, TripError, TripListing, TripSearch};
use hermes_core::CoreError;
use hermes_shared::Role;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiJson, ApiPath, ApiQuery, AppError},
    middleware::Claims,
    state::AppState,
};

/// "My trips" differs by role: drivers get what they published,
/// passengers get what they booked.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MyTrips {
    Published(Vec<Trip>),
    Booked(Vec<BookedTrip>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub message: &'static str,
    pub trip: Trip,
    pub cancelled_bookings: u64,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/trips/search", get(search_trips))
        .route("/trips/{id}", get(get_trip))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip))
        .route("/trips/my-trips", get(my_trips))
        .route("/trips/{id}/cancel", patch(cancel_trip))
        .route("/trips/{id}/complete", patch(complete_trip))
}

async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    if claims.role != Role::Driver {
        return Err(CoreError::from(TripError::DriverRoleRequired).into());
    }
    let new_trip = req.validate().map_err(CoreError::from)?;
    let trip = state
        .trips
        .create_trip(Trip::publish(claims.sub, new_trip, Utc::now()))
        .await?;

    info!("Trip {} published by {} ({} -> {})", trip.id, trip.driver_id, trip.from_city, trip.to_city);
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn search_trips(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TripSearch>,
) -> Result<Json<Vec<TripListing>>, AppError> {
    let filter = query.into_filter().map_err(CoreError::from)?;
    Ok(Json(state.trips.search_trips(&filter).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<TripDetails>, AppError> {
    Ok(Json(state.trips.get_trip_details(id).await?))
}

async fn my_trips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MyTrips>, AppError> {
    let trips = match claims.role {
        Role::Driver => MyTrips::Published(state.trips.list_driver_trips(claims.sub).await?),
        Role::Passenger => MyTrips::Booked(state.trips.list_booked_trips(claims.sub).await?),
    };
    Ok(Json(trips))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    let cancellation = state.trips.cancel_trip(id, claims.sub).await?;
    Ok(Json(CancelResponse {
        message: "Trip cancelled",
        trip: cancellation.trip,
        cancelled_bookings: cancellation.cancelled_bookings,
    }))
}

async fn complete_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let trip = state.trips.complete_trip(id, claims.sub).await?;
    info!("Trip {} completed", trip.id);
    Ok(Json(trip))
}
