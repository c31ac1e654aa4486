//! Session tokens and the authenticated-user extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use common::{Role, UserId};
use domain::Principal;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use store::Store;
use thiserror::Error;

use crate::error::ApiError;
use crate::routes::AppState;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    role: Role,
    iat: usize,
    exp: usize,
}

/// Errors raised while issuing or reading a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    Invalid,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Signs a token for the principal.
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.user_id.to_string(),
            username: principal.username.clone(),
            role: principal.role,
            iat: now.timestamp().max(0) as usize,
            exp: (now + self.ttl).timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verifies a token and resolves the principal it was issued to.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| TokenError::Invalid)?;
        let user_id: UserId = data.claims.sub.parse().map_err(|_| TokenError::Invalid)?;
        Ok(Principal::new(user_id, data.claims.username, data.claims.role))
    }
}

impl<S: Store> FromRef<Arc<AppState<S>>> for TokenService {
    fn from_ref(state: &Arc<AppState<S>>) -> Self {
        state.tokens.clone()
    }
}

/// Extractor for the caller behind the `Authorization: Bearer` header.
///
/// Rejects with 401 when the header is missing or the token does not verify.
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let principal = TokenService::from_ref(state)
            .verify(token.trim())
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
        Ok(Self(principal))
    }
}
