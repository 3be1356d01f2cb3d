use axum::{extract::State, routing::get, Extension, Json, Router};
use hermes_core::identity::{ProfileUpdate, User};
use hermes_core::CoreError;
use tracing::info;

use crate::{error::{ApiJson, AppError}, middleware::Claims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/profile", get(get_profile).put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_user(claims.sub).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let update = update.validate().map_err(CoreError::from)?;
    let user = state.users.update_profile(claims.sub, update).await?;
    info!("Profile {} updated", user.id);
    Ok(Json(user))
}
