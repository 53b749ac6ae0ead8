//! Authentication extractors.
//!
//! The logged-in identity lives in the visitor's session under the same
//! `token`/`user` keys a browser front end keeps in local storage.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::AuthSession;
use crate::store::SessionStore;

async fn session_auth(parts: &Parts) -> Result<Option<AuthSession>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    Ok(AuthSession::load(&SessionStore::new(session.clone())).await?)
}

/// Extractor that requires a logged-in shopper.
///
/// Rejects with a 401 JSON error otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.username)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = session_auth(parts)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_string()))?;
        Ok(Self(auth))
    }
}

/// Extractor that optionally gets the logged-in shopper.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_auth(parts).await?))
    }
}
