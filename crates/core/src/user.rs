//! Authenticated user profile.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Profile returned by the CMS on login or registration.
///
/// Cached in local storage under [`UserProfile::STORAGE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, rename = "documentId", skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl UserProfile {
    /// Local storage key for the cached profile.
    pub const STORAGE_KEY: &'static str = "user";
}
