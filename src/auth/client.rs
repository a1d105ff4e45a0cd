//! Client for the hosted auth service
//!
//! Covers password sign-in, sign-up, sign-out, password change and the
//! user-metadata updates behind the settings page against `{url}/auth/v1`.
//! Input is checked locally first; a request is only sent once it passes
//! those checks.

use crate::auth::session::{AuthUser, Session};
use crate::config::BackendConfig;
use crate::error::{MarketaError, Result};
use chrono::Utc;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Minimum accepted length for a new password
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            user: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Result of a sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account exists but the email must be confirmed before sign-in
    ConfirmationRequired(AuthUser),
    /// The service confirmed the account immediately and opened a session
    SignedIn(Session),
}

/// Profile fields kept in user metadata
///
/// Only the fields that are set are sent, so an update never blanks a
/// field the caller left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.company.is_none() && self.website.is_none()
    }
}

/// Notification switches kept in user metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email_notifications: bool,
    pub marketing_emails: bool,
    pub campaign_alerts: bool,
    pub weekly_reports: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            marketing_emails: false,
            campaign_alerts: true,
            weekly_reports: true,
        }
    }
}

/// Check sign-in/sign-up input
///
/// # Errors
///
/// Returns a validation error when either field is empty
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(MarketaError::Validation("Please fill in all fields.".to_string()).into());
    }
    Ok(())
}

/// Check a password change request
///
/// # Examples
///
/// ```
/// use marketa::auth::validate_new_password;
///
/// assert!(validate_new_password("secret1", "secret1").is_ok());
/// assert!(validate_new_password("secret1", "secret2").is_err());
/// assert!(validate_new_password("abc", "abc").is_err());
/// ```
pub fn validate_new_password(new_password: &str, confirm: &str) -> Result<()> {
    if new_password.is_empty() || confirm.is_empty() {
        return Err(
            MarketaError::Validation("Please fill in all password fields".to_string()).into(),
        );
    }
    if new_password != confirm {
        return Err(MarketaError::Validation("New passwords do not match".to_string()).into());
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MarketaError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    Ok(())
}

/// Client for the auth service
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("marketa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                MarketaError::Authentication(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("{} failed with {}: {}", what, status, body);

        let message = serde_json::from_str::<AuthErrorBody>(&body)
            .ok()
            .and_then(|b| b.error_description.or(b.msg).or(b.message))
            .unwrap_or_else(|| format!("{} failed with status {}", what, status));

        Err(MarketaError::Authentication(message).into())
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty input, or an authentication
    /// error carrying the service's message
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        validate_credentials(email, password)?;

        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        let response = Self::check(response, "Sign in").await?;
        let token: TokenResponse = response.json().await?;

        tracing::info!("Signed in as {}", token.user.id);
        Ok(token.into_session())
    }

    /// Create an account
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty input, or an authentication
    /// error carrying the service's message
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        validate_credentials(email, password)?;

        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        let response = Self::check(response, "Sign up").await?;
        let body: serde_json::Value = response.json().await?;

        // With auto-confirm the service answers with a full token response;
        // otherwise the body is the pending user.
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)?;
            return Ok(SignUpOutcome::SignedIn(token.into_session()));
        }

        let user: AuthUser = serde_json::from_value(body)?;
        tracing::info!("Sign-up pending confirmation for {}", user.id);
        Ok(SignUpOutcome::ConfirmationRequired(user))
    }

    /// End a session on the server
    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        Self::check(response, "Sign out").await?;
        tracing::info!("Signed out {}", session.user.id);
        Ok(())
    }

    /// Change the signed-in user's password
    ///
    /// # Errors
    ///
    /// Returns a validation error when the new password is missing, does
    /// not match its confirmation, or is too short
    pub async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
        confirm: &str,
    ) -> Result<()> {
        validate_new_password(new_password, confirm)?;

        let response = self
            .client
            .put(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        Self::check(response, "Password update").await?;
        Ok(())
    }

    async fn update_metadata(
        &self,
        session: &Session,
        data: serde_json::Value,
        what: &str,
    ) -> Result<()> {
        let response = self
            .client
            .put(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .json(&json!({ "data": data }))
            .send()
            .await?;

        Self::check(response, what).await?;
        tracing::info!("{} saved for {}", what, session.user.id);
        Ok(())
    }

    /// Save profile fields to the user's metadata
    ///
    /// # Errors
    ///
    /// Returns a validation error when no field is set, or an
    /// authentication error carrying the service's message
    pub async fn update_profile(&self, session: &Session, profile: &Profile) -> Result<()> {
        if profile.is_empty() {
            return Err(MarketaError::Validation("No profile fields to update".to_string()).into());
        }
        self.update_metadata(session, serde_json::to_value(profile)?, "Profile update")
            .await
    }

    /// Save notification switches to the user's metadata
    pub async fn update_preferences(
        &self,
        session: &Session,
        preferences: &NotificationPreferences,
    ) -> Result<()> {
        self.update_metadata(
            session,
            serde_json::to_value(preferences)?,
            "Notification preferences",
        )
        .await
    }
}
