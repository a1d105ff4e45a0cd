//! REST-backed record store
//!
//! Speaks the PostgREST dialect exposed by the hosted service:
//! `{url}/rest/v1/{table}` with `eq.` filters, `order=` and
//! `Prefer: return=representation` on writes. Every request carries the
//! public `apikey` header plus a bearer token, which is the signed-in
//! user's access token when one is set and the anon key otherwise.

use crate::config::BackendConfig;
use crate::error::{MarketaError, Result};
use crate::store::types::{
    Campaign, CampaignStatus, ConversationRecord, NewCampaign, NewConversation, WaitlistEntry,
    CAMPAIGNS_TABLE, CONVERSATIONS_TABLE, WAITLIST_TABLE,
};
use crate::store::RecordStore;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;

/// Record store backed by the hosted REST interface
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestStore {
    /// Create a store for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::config::BackendConfig;
    /// use marketa::store::RestStore;
    ///
    /// let store = RestStore::new(&BackendConfig::default());
    /// assert!(store.is_ok());
    /// ```
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("marketa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketaError::Store(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized REST store: url={}", config.url);

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    /// Use the signed-in user's access token for subsequent requests
    pub fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", what, e);
            MarketaError::Store(format!("{} request failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("{} returned error {}: {}", what, status, body);
            return Err(
                MarketaError::Store(format!("{} returned {}: {}", what, status, body)).into(),
            );
        }

        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<Vec<T>> {
        let response = self.send(builder, what).await?;
        response.json::<Vec<T>>().await.map_err(|e| {
            MarketaError::Store(format!("Failed to parse {} response: {}", what, e)).into()
        })
    }

    async fn single<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        self.rows(builder, what)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketaError::Store(format!("{} returned no rows", what)).into())
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn insert_conversation(&self, new: NewConversation) -> Result<ConversationRecord> {
        tracing::debug!("Inserting conversation record");
        let builder = self
            .request(Method::POST, CONVERSATIONS_TABLE)
            .header("Prefer", "return=representation")
            .json(&[new]);
        self.single(builder, "insert conversation").await
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<ConversationRecord>> {
        let builder = self
            .request(Method::GET, CONVERSATIONS_TABLE)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let rows: Vec<ConversationRecord> = self.rows(builder, "read conversation").await?;
        Ok(rows.into_iter().next())
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        campaign_id: Option<i64>,
    ) -> Result<Vec<ConversationRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.asc".to_string()),
        ];
        if let Some(campaign_id) = campaign_id {
            query.push(("campaign_id", format!("eq.{}", campaign_id)));
        }
        let builder = self.request(Method::GET, CONVERSATIONS_TABLE).query(&query);
        self.rows(builder, "list conversations").await
    }

    async fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        tracing::debug!("Inserting campaign '{}'", new.name);
        let builder = self
            .request(Method::POST, CAMPAIGNS_TABLE)
            .header("Prefer", "return=representation")
            .json(&[new]);
        self.single(builder, "insert campaign").await
    }

    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let builder = self
            .request(Method::GET, CAMPAIGNS_TABLE)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let rows: Vec<Campaign> = self.rows(builder, "read campaign").await?;
        Ok(rows.into_iter().next())
    }

    async fn list_campaigns(&self, user_id: &str) -> Result<Vec<Campaign>> {
        let builder = self.request(Method::GET, CAMPAIGNS_TABLE).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        self.rows(builder, "list campaigns").await
    }

    async fn update_campaign_status(&self, id: i64, status: CampaignStatus) -> Result<Campaign> {
        let builder = self
            .request(Method::PATCH, CAMPAIGNS_TABLE)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": status }));
        self.single(builder, "update campaign").await
    }

    async fn delete_campaign(&self, id: i64) -> Result<()> {
        let builder = self
            .request(Method::DELETE, CAMPAIGNS_TABLE)
            .query(&[("id", format!("eq.{}", id))]);
        self.send(builder, "delete campaign").await?;
        Ok(())
    }

    async fn insert_waitlist_email(&self, email: &str) -> Result<()> {
        let entry = WaitlistEntry {
            email: email.to_string(),
        };
        let builder = self
            .request(Method::POST, WAITLIST_TABLE)
            .header("Prefer", "return=minimal")
            .json(&[entry]);
        self.send(builder, "join waitlist").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let store = RestStore::new(&backend("https://example.test/")).unwrap();
        assert_eq!(
            store.table_url(CONVERSATIONS_TABLE),
            "https://example.test/rest/v1/Conversations"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let store = RestStore::new(&backend("https://example.test")).unwrap();
        assert_eq!(store.bearer(), "anon");

        store.set_access_token(Some("user-token".to_string()));
        assert_eq!(store.bearer(), "user-token");

        store.set_access_token(None);
        assert_eq!(store.bearer(), "anon");
    }
}
