//! Login, registration and logout.
//!
//! Credentials are checked locally first, then exchanged with the CMS for a
//! bearer token. The token and profile are persisted to the caller's
//! [`LocalStore`], and any guest cart is merged into the user's cart.

use thiserror::Error;
use tracing::instrument;
use zone7_core::{
    Email, EmailError, PasswordError, Username, UsernameError, validate_login_password,
    validate_new_password,
};

use super::cart::{CartService, MergeReport, load_guest_cart, save_guest_cart};
use crate::cms::{AuthRepository, CartRepository, CmsError};
use crate::models::AuthSession;
use crate::store::{LocalStore, StoreError};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Username outside the allowed length.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Password too short or missing a character class.
    #[error("{0}")]
    WeakPassword(PasswordError),

    /// Password and confirmation differ.
    #[error("passwords must match")]
    PasswordMismatch,

    /// Wrong identifier or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The CMS refused or failed the request.
    #[error("authentication service error: {0}")]
    Cms(#[from] CmsError),

    /// The session could not be persisted.
    #[error("could not save session: {0}")]
    Store(#[from] StoreError),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => Self::PasswordMismatch,
            other => Self::WeakPassword(other),
        }
    }
}

/// Registration form input.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

/// A successful login or registration.
#[derive(Debug)]
pub struct SignedIn {
    pub session: AuthSession,
    /// Present when a non-empty guest cart was merged.
    pub merge: Option<MergeReport>,
}

/// Authentication against the CMS user store.
#[derive(Debug, Clone)]
pub struct AuthService<A, C> {
    repo: A,
    cart: CartService<C>,
}

impl<A: AuthRepository, C: CartRepository> AuthService<A, C> {
    #[must_use]
    pub const fn new(repo: A, cart: CartService<C>) -> Self {
        Self { repo, cart }
    }

    /// Log in with an email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error before contacting the CMS,
    /// `InvalidCredentials` if the CMS rejects the pair, or a CMS/store error.
    #[instrument(skip(self, store, password))]
    pub async fn login<S: LocalStore>(
        &self,
        store: &S,
        identifier: &str,
        password: &str,
    ) -> Result<SignedIn, AuthError> {
        let email = Email::parse(identifier)?;
        validate_login_password(password)?;

        let session = self
            .repo
            .login(email.as_str(), password)
            .await
            .map_err(|e| match e {
                CmsError::Api { status: 400, .. } | CmsError::Unauthorized(_) => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::Cms(other),
            })?;

        self.establish(store, session).await
    }

    /// Create an account and log in.
    ///
    /// # Errors
    ///
    /// Returns a validation error before contacting the CMS, or the CMS's
    /// rejection (e.g. the email is already taken).
    #[instrument(skip(self, store, form), fields(username = %form.username))]
    pub async fn register<S: LocalStore>(
        &self,
        store: &S,
        form: &Registration,
    ) -> Result<SignedIn, AuthError> {
        let username = Username::parse(&form.username)?;
        let email = Email::parse(&form.email)?;
        validate_new_password(&form.password, &form.confirm_password)?;

        let session = self
            .repo
            .register(username.as_str(), email.as_str(), &form.password)
            .await?;

        self.establish(store, session).await
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    #[instrument(skip_all)]
    pub async fn logout<S: LocalStore>(&self, store: &S) -> Result<(), AuthError> {
        AuthSession::clear(store).await?;
        Ok(())
    }

    /// The stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn current<S: LocalStore>(&self, store: &S) -> Result<Option<AuthSession>, AuthError> {
        Ok(AuthSession::load(store).await?)
    }

    /// Persist the session and fold in the guest cart.
    ///
    /// Lines the CMS failed to take stay in the guest cart; everything else
    /// is removed from it.
    async fn establish<S: LocalStore>(
        &self,
        store: &S,
        session: AuthSession,
    ) -> Result<SignedIn, AuthError> {
        session.save(store).await?;
        tracing::info!(user_id = %session.user_id(), "Signed in");

        let mut guest = load_guest_cart(store).await?;
        if guest.is_empty() {
            return Ok(SignedIn {
                session,
                merge: None,
            });
        }

        let merge = match self.cart.merge_guest(&session, &guest).await {
            Ok(report) => {
                if !report.is_clean() {
                    tracing::info!(
                        capped = report.capped.len(),
                        skipped = report.skipped.len(),
                        failed = report.failed.len(),
                        "Guest cart merged with adjustments"
                    );
                }
                guest.lines.retain(|l| {
                    report
                        .failed
                        .iter()
                        .any(|f| f.product_id == l.product_id && f.size == l.size)
                });
                save_guest_cart(store, &guest).await?;
                Some(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Guest cart merge failed; keeping guest cart");
                None
            }
        };

        Ok(SignedIn { session, merge })
    }
}
