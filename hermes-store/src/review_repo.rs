use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use hermes_core::repository::ReviewRepository;
use hermes_core::{CoreError, CoreResult};
use hermes_review::{check_participation, NewReview, Rating, Review, ReviewError, ReviewView};

use crate::rows::{ReviewRow, ReviewViewRow, REVIEW_COLUMNS};
use crate::{db_err, is_unique_violation};

pub struct StoreReviewRepository {
    pool: PgPool,
}

impl StoreReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serialize rating writes per target so each recompute sees every
/// committed review.
async fn lock_target(tx: &mut Transaction<'_, Postgres>, target_id: Uuid) -> CoreResult<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(target_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::not_found("User"))?;
    Ok(())
}

async fn recompute_rating(tx: &mut Transaction<'_, Postgres>, target_id: Uuid) -> CoreResult<()> {
    sqlx::query(
        "UPDATE users SET \
           rating = COALESCE((SELECT AVG(rating)::float8 FROM reviews WHERE target_id = $1), 0), \
           reviews_count = (SELECT COUNT(*)::int4 FROM reviews WHERE target_id = $1), \
           updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(target_id)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

fn review_view_select() -> String {
    format!(
        "SELECT {REVIEW_COLUMNS}, a.full_name AS author_name, a.avatar_url AS author_avatar, \
         tg.full_name AS target_name, tg.avatar_url AS target_avatar, \
         t.from_city, t.to_city, t.trip_date \
         FROM reviews r \
         JOIN users a ON a.id = r.author_id \
         JOIN users tg ON tg.id = r.target_id \
         JOIN trips t ON t.id = r.trip_id"
    )
}

#[async_trait]
impl ReviewRepository for StoreReviewRepository {
    async fn submit_review(&self, review: NewReview) -> CoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let driver_id = sqlx::query_scalar::<_, Uuid>("SELECT driver_id FROM trips WHERE id = $1")
            .bind(review.trip_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Trip"))?;

        let confirmed = sqlx::query_scalar::<_, Uuid>(
            "SELECT passenger_id FROM bookings WHERE trip_id = $1 AND status = 'confirmed'",
        )
        .bind(review.trip_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        check_participation(driver_id, review.author_id, review.target_id, &confirmed)?;
        lock_target(&mut tx, review.target_id).await?;

        let stored = review.into_review(chrono::Utc::now());
        let sql = format!(
            "INSERT INTO reviews AS r (id, trip_id, author_id, target_id, rating, comment, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(stored.id)
            .bind(stored.trip_id)
            .bind(stored.author_id)
            .bind(stored.target_id)
            .bind(stored.rating)
            .bind(&stored.comment)
            .bind(stored.created_at)
            .bind(stored.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::from(ReviewError::Duplicate)
                } else {
                    db_err(e)
                }
            })?;

        recompute_rating(&mut tx, stored.target_id).await?;
        tx.commit().await.map_err(db_err)?;

        info!("Review {} on trip {} for user {}", row.id, row.trip_id, row.target_id);
        Ok(row.into())
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        author_id: Uuid,
        rating: Rating,
        comment: Option<String>,
    ) -> CoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = $1");
        let current: Review = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("Review"))?
            .into();
        current.ensure_author(author_id)?;
        lock_target(&mut tx, current.target_id).await?;

        let sql = format!(
            "UPDATE reviews r SET rating = $1, comment = $2, updated_at = NOW() \
             WHERE r.id = $3 RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(rating.value())
            .bind(&comment)
            .bind(review_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

        recompute_rating(&mut tx, current.target_id).await?;
        tx.commit().await.map_err(db_err)?;

        info!("Review {} updated", review_id);
        Ok(row.into())
    }

    async fn list_reviews_for(&self, target_id: Uuid) -> CoreResult<Vec<ReviewView>> {
        let sql = format!("{} WHERE r.target_id = $1 ORDER BY r.created_at DESC", review_view_select());
        let rows = sqlx::query_as::<_, ReviewViewRow>(&sql)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(ReviewView::from).collect())
    }

    async fn list_reviews_by(&self, author_id: Uuid) -> CoreResult<Vec<ReviewView>> {
        let sql = format!("{} WHERE r.author_id = $1 ORDER BY r.created_at DESC", review_view_select());
        let rows = sqlx::query_as::<_, ReviewViewRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(ReviewView::from).collect())
    }

    async fn find_review(&self, trip_id: Uuid, author_id: Uuid) -> CoreResult<Option<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.trip_id = $1 AND r.author_id = $2 \
             ORDER BY r.created_at ASC LIMIT 1"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(trip_id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Review::from))
    }
}
