use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Guards the read views once an admin secret is configured.
pub async fn auth<B>(
    State(config): State<Arc<JwtConfig>>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<impl IntoResponse, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(str::to_owned);

    let token = token.ok_or_else(|| {
        AppError::Unauthorized("You are not logged in, please provide token".to_string())
    })?;

    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Rejected admin token: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })?
    .claims;

    req.extensions_mut().insert(UserId(claims.sub));
    Ok(next.run(req).await)
}

#[derive(Debug, Clone)]
pub struct UserId(pub String);

#[derive(Debug)]
pub struct JwtConfig {
    pub jwt_secret: String,
}

impl JwtConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }
}
