use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use hermes_core::CoreError;
use hermes_review::{NewReview, Review, ReviewCheck, ReviewEdit, ReviewSubmission, ReviewView};
use uuid::Uuid;

use crate::{
    error::{ApiJson, ApiPath, AppError},
    middleware::Claims,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/{id}", put(update_review))
        .route("/reviews/user/{id}", get(user_reviews))
        .route("/reviews/my-reviews", get(my_reviews))
        .route("/reviews/written", get(written_reviews))
        .route("/reviews/check/{trip_id}", get(check_review))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ReviewSubmission>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = NewReview::from_submission(claims.sub, req).map_err(CoreError::from)?;
    Ok((StatusCode::CREATED, Json(state.reviews.submit_review(review).await?)))
}

async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReviewEdit>,
) -> Result<Json<Review>, AppError> {
    let (rating, comment) = req.validate().map_err(CoreError::from)?;
    Ok(Json(state.reviews.update_review(id, claims.sub, rating, comment).await?))
}

async fn user_reviews(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<ReviewView>>, AppError> {
    Ok(Json(state.reviews.list_reviews_for(user_id).await?))
}

async fn my_reviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReviewView>>, AppError> {
    Ok(Json(state.reviews.list_reviews_for(claims.sub).await?))
}

async fn written_reviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReviewView>>, AppError> {
    Ok(Json(state.reviews.list_reviews_by(claims.sub).await?))
}

async fn check_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(trip_id): ApiPath<Uuid>,
) -> Result<Json<ReviewCheck>, AppError> {
    let review = state.reviews.find_review(trip_id, claims.sub).await?;
    Ok(Json(ReviewCheck::from(review)))
}
