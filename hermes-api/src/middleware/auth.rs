use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use hermes_shared::{Masked, Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Masked<String>,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(auth: &AuthConfig, user_id: Uuid, email: &str, role: Role) -> Result<String, AppError> {
    let lifetime = i64::try_from(auth.expiration).unwrap_or(i64::MAX);
    let exp = (Utc::now() + Duration::seconds(lifetime)).timestamp();
    let claims = Claims {
        sub: user_id,
        email: Masked(email.to_string()),
        role,
        exp: usize::try_from(exp).unwrap_or(usize::MAX),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))
}

/// Rejects the request with 401 unless it carries a valid bearer token;
/// otherwise makes the [`Claims`] available to handlers as an extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("Authorization header required".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("Invalid authorization format".to_string()))?;

    let claims = verify_token(&state.auth, token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
