use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use hermes_booking::BookedTrip;
use hermes_catalog::{SearchFilter, Trip, TripDetails, TripListing, TripStatus};
use hermes_core::repository::{TripCancellation, TripRepository};
use hermes_core::{CoreError, CoreResult};

use crate::db_err;
use crate::rows::{convert_all, BookedTripRow, TripDriverRow, TripRow, TRIP_COLUMNS};

pub struct StoreTripRepository {
    pool: PgPool,
}

impl StoreTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn driver_join_select() -> String {
    format!(
        "SELECT {TRIP_COLUMNS}, u.full_name AS driver_name, u.rating AS driver_rating, \
         u.car_brand, u.car_model, u.phone AS driver_phone \
         FROM trips t JOIN users u ON u.id = t.driver_id"
    )
}

/// Lock the trip row for the rest of the transaction.
pub(crate) async fn lock_trip(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    trip_id: Uuid,
) -> CoreResult<Trip> {
    let sql = format!("SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1 FOR UPDATE");
    sqlx::query_as::<_, TripRow>(&sql)
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::not_found("Trip"))?
        .try_into()
}

async fn set_status(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    trip_id: Uuid,
    status: TripStatus,
) -> CoreResult<Trip> {
    let sql = format!(
        "UPDATE trips t SET status = $1, updated_at = NOW() WHERE t.id = $2 RETURNING {TRIP_COLUMNS}"
    );
    sqlx::query_as::<_, TripRow>(&sql)
        .bind(status.as_str())
        .bind(trip_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?
        .try_into()
}

#[async_trait]
impl TripRepository for StoreTripRepository {
    async fn create_trip(&self, trip: Trip) -> CoreResult<Trip> {
        let sql = format!(
            "INSERT INTO trips AS t (id, driver_id, from_city, to_city, trip_date, trip_time, price, seats, \
             available_seats, description, no_smoking, animals_allowed, music_allowed, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {TRIP_COLUMNS}"
        );
        sqlx::query_as::<_, TripRow>(&sql)
            .bind(trip.id)
            .bind(trip.driver_id)
            .bind(&trip.from_city)
            .bind(&trip.to_city)
            .bind(trip.trip_date)
            .bind(trip.trip_time)
            .bind(trip.price)
            .bind(trip.seats)
            .bind(trip.available_seats)
            .bind(&trip.description)
            .bind(trip.amenities.no_smoking)
            .bind(trip.amenities.animals_allowed)
            .bind(trip.amenities.music_allowed)
            .bind(trip.status.as_str())
            .bind(trip.created_at)
            .bind(trip.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_into()
    }

    async fn get_trip(&self, id: Uuid) -> CoreResult<Trip> {
        let sql = format!("SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1");
        sqlx::query_as::<_, TripRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Trip"))?
            .try_into()
    }

    async fn get_trip_details(&self, id: Uuid) -> CoreResult<TripDetails> {
        let sql = format!("{} WHERE t.id = $1", driver_join_select());
        sqlx::query_as::<_, TripDriverRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Trip"))?
            .into_details()
    }

    async fn search_trips(&self, filter: &SearchFilter) -> CoreResult<Vec<TripListing>> {
        let mut qb = QueryBuilder::<Postgres>::new(driver_join_select());
        qb.push(" WHERE t.status = 'active' AND t.available_seats > 0");
        if let Some(from) = &filter.from {
            qb.push(" AND t.from_city ILIKE ").push_bind(SearchFilter::like_pattern(from));
        }
        if let Some(to) = &filter.to {
            qb.push(" AND t.to_city ILIKE ").push_bind(SearchFilter::like_pattern(to));
        }
        if let Some(date) = filter.date {
            qb.push(" AND t.trip_date = ").push_bind(date);
        }
        qb.push(" ORDER BY t.trip_date ASC, t.trip_time ASC, t.created_at ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = qb
            .build_query_as::<TripDriverRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows, TripDriverRow::into_listing)
    }

    async fn list_driver_trips(&self, driver_id: Uuid) -> CoreResult<Vec<Trip>> {
        let sql = format!(
            "SELECT {TRIP_COLUMNS} FROM trips t WHERE t.driver_id = $1 \
             ORDER BY t.trip_date DESC, t.trip_time DESC"
        );
        let rows = sqlx::query_as::<_, TripRow>(&sql)
            .bind(driver_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows, Trip::try_from)
    }

    async fn list_booked_trips(&self, passenger_id: Uuid) -> CoreResult<Vec<BookedTrip>> {
        let sql = format!(
            "SELECT {TRIP_COLUMNS}, b.id AS booking_id, b.seats_booked, b.status AS booking_status \
             FROM bookings b JOIN trips t ON t.id = b.trip_id \
             WHERE b.passenger_id = $1 \
             ORDER BY t.trip_date DESC, t.trip_time DESC, b.created_at DESC"
        );
        let rows = sqlx::query_as::<_, BookedTripRow>(&sql)
            .bind(passenger_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows, BookedTrip::try_from)
    }

    async fn cancel_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<TripCancellation> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current = lock_trip(&mut tx, trip_id).await?;
        let status = current.plan_transition(requester, TripStatus::Cancelled)?;
        let trip = set_status(&mut tx, trip_id, status).await?;

        let cancelled_bookings = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW() \
             WHERE trip_id = $1 AND status = 'pending'",
        )
        .bind(trip_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        tx.commit().await.map_err(db_err)?;

        info!("Trip {} cancelled, {} pending bookings cancelled", trip_id, cancelled_bookings);
        Ok(TripCancellation {
            trip,
            cancelled_bookings,
        })
    }

    async fn complete_trip(&self, trip_id: Uuid, requester: Uuid) -> CoreResult<Trip> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current = lock_trip(&mut tx, trip_id).await?;
        let status = current.plan_transition(requester, TripStatus::Completed)?;
        let trip = set_status(&mut tx, trip_id, status).await?;

        tx.commit().await.map_err(db_err)?;
        Ok(trip)
    }
}
