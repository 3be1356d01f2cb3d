use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use hermes_core::identity::{LoginRequest, NewUser, Registration};
use hermes_core::CoreError;
use hermes_shared::{Masked, Role};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{error::{ApiJson, AppError}, middleware::issue_token, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserSummary,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn hash_password(password: Masked<String>, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose(), cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

async fn verify_password(password: Masked<String>, hash: Masked<String>) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password.expose(), hash.expose()))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = req.validate().map_err(CoreError::from)?;
    let role = req.role();
    let password_hash = hash_password(req.password, state.auth.bcrypt_cost).await?;

    let user = state
        .users
        .create_user(NewUser {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            password_hash: Masked(password_hash),
            role,
        })
        .await?;

    let token = issue_token(&state.auth, user.id, user.email.expose(), user.role)?;
    info!("Registered user {} as {}", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: UserSummary {
                id: user.id,
                name: user.full_name,
                email: user.email,
                role: user.role,
                rating: None,
                reviews_count: None,
            },
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::AuthenticationError("Invalid email or password".to_string());

    let credentials = state
        .users
        .find_credentials_by_email(&req.normalized_email())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(req.password, credentials.password_hash).await? {
        return Err(invalid());
    }

    let token = issue_token(&state.auth, credentials.id, credentials.email.expose(), credentials.role)?;
    info!("User {} logged in", credentials.id);

    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: UserSummary {
            id: credentials.id,
            name: credentials.full_name,
            email: credentials.email,
            role: credentials.role,
            rating: Some(credentials.rating),
            reviews_count: Some(credentials.reviews_count),
        },
    }))
}
