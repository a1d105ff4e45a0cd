//! Signed-in session and its keyring cache
//!
//! A [`Session`] is what the auth service hands back after a password
//! sign-in. The CLI keeps it in the operating system's credential store
//! between invocations through [`SessionCache`]; nothing else in the crate
//! depends on session internals beyond "present or not" and the access
//! token used as a bearer credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The user a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user id; used as the owner reference on records
    pub id: String,
    /// Sign-in email
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use marketa::auth::{AuthUser, Session};
///
/// let session = Session {
///     access_token: "tok".to_string(),
///     refresh_token: None,
///     expires_at: Some(Utc::now() + Duration::hours(1)),
///     user: AuthUser { id: "u1".to_string(), email: None },
/// };
/// assert!(!session.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for REST and function calls
    pub access_token: String,

    /// Token that can renew the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token stops being accepted
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    /// The signed-in user
    pub user: AuthUser,
}

impl Session {
    /// Returns `true` when the access token is expired or about to expire
    ///
    /// A 60-second buffer is applied. Sessions without an expiry never
    /// expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => Utc::now() >= expires_at - chrono::Duration::seconds(60),
        }
    }
}

/// Keyring-backed storage for the current session
pub struct SessionCache {
    service: String,
    user: String,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self {
            service: "marketa".to_string(),
            user: "session".to_string(),
        }
    }
}

impl SessionCache {
    /// Load the cached session
    ///
    /// Returns `Ok(None)` when nothing is cached, the entry was cleared, or
    /// the cached session has expired.
    pub fn load(&self) -> Result<Option<Session>> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;

        let json = match entry.get_password() {
            Ok(json) => json,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if json.is_empty() {
            return Ok(None);
        }

        let session: Session = serde_json::from_str(&json)?;
        if session.is_expired() {
            tracing::debug!("Cached session expired");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Cache a session
    pub fn save(&self, session: &Session) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;
        entry.set_password(&serde_json::to_string(session)?)?;
        tracing::debug!("Cached session for user {}", session.user.id);
        Ok(())
    }

    /// Forget the cached session (best-effort)
    pub fn clear(&self) -> Result<()> {
        match keyring::Entry::new(&self.service, &self.user) {
            Ok(entry) => {
                if let Err(e) = entry.set_password("") {
                    tracing::warn!("Failed to clear cached session: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Keyring not available while clearing session: {}", e);
            }
        }
        Ok(())
    }
}
