use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Verified user ID taken from the `Authorization` header.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Raw token; a "Bearer " prefix is tolerated
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("No token provided".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!("invalid or expired token");
                Err(AppError::Unauthenticated("Invalid token".into()))
            }
        }
    }
}
