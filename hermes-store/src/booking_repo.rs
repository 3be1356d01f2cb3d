use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use hermes_booking::{
    plan_booking, plan_decision, Booking, BookingDecision, BookingError, BookingRequest, DriverBooking,
    PassengerBooking,
};
use hermes_catalog::Trip;
use hermes_core::repository::BookingRepository;
use hermes_core::{CoreError, CoreResult};

use crate::db_err;
use crate::rows::{convert_all, BookingRow, BookingViewRow, TripRow, BOOKING_COLUMNS, TRIP_COLUMNS};
use crate::trip_repo::lock_trip;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn booking_view_select(party_join: &str) -> String {
    format!(
        "SELECT {BOOKING_COLUMNS}, t.from_city, t.to_city, t.trip_date, t.trip_time, \
         t.status AS trip_status, u.full_name AS party_name, u.phone AS party_phone \
         FROM bookings b JOIN trips t ON t.id = b.trip_id JOIN users u ON {party_join}"
    )
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, passenger_id: Uuid, request: BookingRequest) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Shared lock: a concurrent cancellation cannot slip between this
        // check and the insert and leave a pending booking on a cancelled trip.
        let sql = format!("SELECT {TRIP_COLUMNS} FROM trips t WHERE t.id = $1 FOR SHARE");
        let trip: Trip = sqlx::query_as::<_, TripRow>(&sql)
            .bind(request.trip_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(BookingError::TripUnavailable)?
            .try_into()?;

        let booking = plan_booking(&trip, passenger_id, request.seats_booked)?.into_booking(Utc::now());

        let sql = format!(
            "INSERT INTO bookings AS b (id, trip_id, passenger_id, seats_booked, total_price, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {BOOKING_COLUMNS}"
        );
        let booking: Booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking.id)
            .bind(booking.trip_id)
            .bind(booking.passenger_id)
            .bind(booking.seats_booked)
            .bind(booking.total_price)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .try_into()?;

        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn decide_booking(
        &self,
        booking_id: Uuid,
        decider_id: Uuid,
        decision: BookingDecision,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let trip_id = sqlx::query_scalar::<_, Uuid>("SELECT trip_id FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Booking"))?;

        // Trip before booking, the same order trip cancellation takes them in.
        let trip = lock_trip(&mut tx, trip_id).await?;
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1 FOR UPDATE");
        let booking: Booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .try_into()?;

        let plan = plan_decision(&booking, &trip, decider_id, decision)?;

        if plan.seats_to_reserve > 0 {
            let reserved = sqlx::query(
                "UPDATE trips SET available_seats = available_seats - $1, updated_at = NOW() \
                 WHERE id = $2 AND available_seats >= $1 AND status = 'active'",
            )
            .bind(plan.seats_to_reserve)
            .bind(trip.id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

            if reserved == 0 {
                warn!("Seat guard rejected booking {} on trip {}", booking_id, trip.id);
                return Err(BookingError::SeatsExhausted {
                    requested: plan.seats_to_reserve,
                    available: trip.available_seats,
                }
                .into());
            }
        }

        let sql = format!(
            "UPDATE bookings b SET status = $1, updated_at = NOW() \
             WHERE b.id = $2 AND b.status = 'pending' RETURNING {BOOKING_COLUMNS}"
        );
        let decided: Booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(plan.status.as_str())
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(BookingError::AlreadyProcessed(booking.status))?
            .try_into()?;

        tx.commit().await.map_err(db_err)?;

        info!(
            "Booking {} on trip {} -> {} ({} seats left)",
            booking_id, trip.id, decided.status, plan.available_after
        );
        Ok(decided)
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Booking"))?
            .try_into()
    }

    async fn list_passenger_bookings(&self, passenger_id: Uuid) -> CoreResult<Vec<PassengerBooking>> {
        let sql = format!(
            "{} WHERE b.passenger_id = $1 ORDER BY b.created_at DESC",
            booking_view_select("u.id = t.driver_id")
        );
        let rows = sqlx::query_as::<_, BookingViewRow>(&sql)
            .bind(passenger_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows, BookingViewRow::into_passenger_view)
    }

    async fn list_driver_bookings(&self, driver_id: Uuid) -> CoreResult<Vec<DriverBooking>> {
        let sql = format!(
            "{} WHERE t.driver_id = $1 \
             ORDER BY CASE b.status WHEN 'pending' THEN 0 WHEN 'confirmed' THEN 1 ELSE 2 END, \
             b.created_at DESC",
            booking_view_select("u.id = b.passenger_id")
        );
        let rows = sqlx::query_as::<_, BookingViewRow>(&sql)
            .bind(driver_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows, BookingViewRow::into_driver_view)
    }
}
