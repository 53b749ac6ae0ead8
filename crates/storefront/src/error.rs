//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! the body is always `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cms::CmsError;
use crate::services::{
    AuthError, CartError, CheckoutError, MoveToCartError, WishlistError,
};
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Wishlist error: {0}")]
    Wishlist(#[from] WishlistError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<MoveToCartError> for AppError {
    fn from(err: MoveToCartError) -> Self {
        match err {
            MoveToCartError::Cart(e) => Self::Cart(e),
            MoveToCartError::Wishlist(e) => Self::Wishlist(e),
        }
    }
}

const INTERNAL: &str = "Internal server error";
const UPSTREAM: &str = "The store is temporarily unavailable, please try again";

fn cms_reply(err: &CmsError) -> (StatusCode, String) {
    match err {
        CmsError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
        CmsError::Unauthorized(_) => (
            StatusCode::UNAUTHORIZED,
            "Your session has expired, please log in again".to_string(),
        ),
        CmsError::RateLimited(secs) => (
            StatusCode::TOO_MANY_REQUESTS,
            format!("Too many requests, try again in {secs} seconds"),
        ),
        CmsError::Api { message, .. } if err.is_client_error() => {
            (StatusCode::BAD_REQUEST, message.clone())
        }
        CmsError::InvalidUrl(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
        CmsError::Api { .. } | CmsError::Http(_) | CmsError::Parse(_) => {
            (StatusCode::BAD_GATEWAY, UPSTREAM.to_string())
        }
    }
}

fn cart_reply(err: &CartError) -> (StatusCode, String) {
    match err {
        CartError::Cms(e) => cms_reply(e),
        CartError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
        CartError::Unauthorized => (StatusCode::UNAUTHORIZED, err.to_string()),
        CartError::InvalidQuantity | CartError::SizeUnavailable(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CartError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        CartError::StockExceeded { .. } | CartError::Busy => (StatusCode::CONFLICT, err.to_string()),
    }
}

impl AppError {
    /// Status and user-facing message. Internal details never reach the body.
    fn reply(&self) -> (StatusCode, String) {
        match self {
            Self::Cms(e) => cms_reply(e),
            Self::Cart(e) => cart_reply(e),
            Self::Wishlist(e) => match e {
                WishlistError::Cms(e) => cms_reply(e),
                WishlistError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
                WishlistError::Busy => (StatusCode::CONFLICT, e.to_string()),
            },
            Self::Auth(e) => match e {
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
                AuthError::Cms(e) => cms_reply(e),
                AuthError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch => (StatusCode::BAD_REQUEST, e.to_string()),
            },
            Self::Checkout(e) => match e {
                CheckoutError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
                CheckoutError::MissingField(_)
                | CheckoutError::UnsupportedCity(_)
                | CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, e.to_string()),
                CheckoutError::StockChanged { .. } => (StatusCode::CONFLICT, e.to_string()),
                CheckoutError::Cart(e) => cart_reply(e),
                CheckoutError::Cms(e) => cms_reply(e),
            },
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.reply();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
