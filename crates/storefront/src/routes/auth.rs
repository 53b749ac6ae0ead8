//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use zone7_core::user::UserProfile;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::services::{MergeReport, Registration, SignedIn};
use crate::state::AppState;
use crate::store::SessionStore;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(alias = "email")]
    pub identifier: String,
    pub password: String,
}

/// Login or registration result.
#[derive(Debug, Serialize)]
pub struct SignedInView {
    pub user: UserProfile,
    /// Present when a guest cart was merged.
    pub merge: Option<MergeReport>,
}

/// Start a fresh session id on privilege change.
async fn rotate(session: &Session) {
    if let Err(e) = session.cycle_id().await {
        tracing::error!("Failed to cycle session id: {}", e);
    }
}

async fn signed_in(session: &Session, signed_in: SignedIn) -> Json<SignedInView> {
    rotate(session).await;
    let user = signed_in.session.user;
    set_sentry_user(&user.id, Some(&user.email));
    Json(SignedInView {
        user,
        merge: signed_in.merge,
    })
}

/// Log in with email and password.
#[instrument(skip_all, fields(identifier = %form.identifier))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<SignedInView>> {
    let store = SessionStore::new(session.clone());
    let result = state
        .auth()
        .login(&store, &form.identifier, &form.password)
        .await?;
    Ok(signed_in(&session, result).await)
}

/// Create an account and log in.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<SignedInView>)> {
    let store = SessionStore::new(session.clone());
    let result = state.auth().register(&store, &form).await?;
    Ok((StatusCode::CREATED, signed_in(&session, result).await))
}

/// Log out. Filters and the guest cart stay in the session.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    state
        .auth()
        .logout(&SessionStore::new(session.clone()))
        .await?;
    clear_sentry_user();
    rotate(&session).await;
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user's profile.
pub async fn me(RequireAuth(auth): RequireAuth) -> Json<UserProfile> {
    Json(auth.user)
}
