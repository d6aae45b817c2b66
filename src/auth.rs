//! Token authentication.
//!
//! Clients send `Authorization: Token <key>`; `Bearer <key>` is accepted as
//! well. The key resolves to a user id through the token cache, falling back
//! to the `auth_tokens` table, and the user row is loaded on every request.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use model::entities::{auth_token, user};
use sea_orm::EntityTrait;
use tracing::{debug, trace, warn};

use crate::schemas::{database_error, unauthorized, ApiError, AppState};

/// The authenticated, active user behind the request's token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// Extracts the token key from an `Authorization` header value.
fn parse_token(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                debug!("Request without authorization header");
                unauthorized("Authentication credentials were not provided.")
            })?;

        let key = parse_token(header).ok_or_else(|| {
            warn!("Malformed authorization header");
            unauthorized("Invalid token header.")
        })?;

        let user_id = match state.token_cache.get(key).await {
            Some(user_id) => {
                trace!("Token cache hit for user {}", user_id);
                user_id
            }
            None => {
                let token = auth_token::Entity::find_by_id(key.to_string())
                    .one(&state.db)
                    .await
                    .map_err(|e| database_error("Failed to look up token", e))?
                    .ok_or_else(|| {
                        warn!("Unknown token presented");
                        unauthorized("Invalid token.")
                    })?;
                state.token_cache.insert(key.to_string(), token.user_id).await;
                token.user_id
            }
        };

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|e| database_error("Failed to load user", e))?;

        match user {
            Some(user) if user.is_active => {
                trace!("Authenticated user {}", user.id);
                Ok(AuthUser(user))
            }
            Some(user) => {
                warn!("Inactive user {} presented a token", user.id);
                Err(unauthorized("User inactive or deleted."))
            }
            None => {
                state.token_cache.invalidate(key).await;
                warn!("Token references missing user {}", user_id);
                Err(unauthorized("User inactive or deleted."))
            }
        }
    }
}
