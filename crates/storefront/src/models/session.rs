//! Session-related types.
//!
//! The authenticated identity is the CMS bearer token plus the cached user
//! profile, persisted in a [`LocalStore`] under `token` and `user`.

use secrecy::{ExposeSecret, SecretString};
use zone7_core::UserId;
use zone7_core::user::UserProfile;

use crate::store::{LocalStore, StoreError, keys};

/// A logged-in shopper.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AuthSession {
    token: SecretString,
    pub user: UserProfile,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    #[must_use]
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Rehydrate the session from storage.
    ///
    /// Returns `None` unless both the token and the profile are present. A
    /// corrupt profile is treated as logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself fails.
    pub async fn load<S: LocalStore>(store: &S) -> Result<Option<Self>, StoreError> {
        let Some(token) = store.get(keys::TOKEN).await? else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            return Ok(None);
        }

        match store.get_json::<UserProfile>(keys::USER).await {
            Ok(Some(user)) => Ok(Some(Self::new(token, user))),
            Ok(None) => Ok(None),
            Err(StoreError::Serialization(e)) => {
                tracing::warn!(error = %e, "Ignoring corrupt stored user profile");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Persist the token and profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn save<S: LocalStore>(&self, store: &S) -> Result<(), StoreError> {
        store
            .set(keys::TOKEN, self.token.expose_secret().to_owned())
            .await?;
        store.set_json(keys::USER, &self.user).await
    }

    /// Remove the token and profile (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear<S: LocalStore>(store: &S) -> Result<(), StoreError> {
        store.remove(keys::TOKEN).await?;
        store.remove(keys::USER).await
    }
}
