//! In-process record store
//!
//! [`MemoryStore`] keeps every table in memory behind a mutex, assigns
//! ordinal ids the way the hosted tables do, and publishes a
//! [`ResponseEvent`] whenever a conversation's response is filled in.
//!
//! From a test, [`MemoryStore::set_response`] plays the external writer
//! that populates replies, and the `fail_*` switches inject transport
//! failures.
//!
//! # Example
//!
//! ```
//! use marketa::store::{MemoryStore, NewConversation, RecordStore};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let record = store
//!     .insert_conversation(NewConversation {
//!         prompt: "hello".to_string(),
//!         response: None,
//!         user_id: Some("u1".to_string()),
//!         campaign_id: None,
//!     })
//!     .await?;
//!
//! store.set_response(record.id, "hi there")?;
//! let stored = store.get_conversation(record.id).await?.unwrap();
//! assert_eq!(stored.response.as_deref(), Some("hi there"));
//! # Ok(())
//! # }
//! ```

use crate::error::{MarketaError, Result};
use crate::store::types::{
    Campaign, CampaignStatus, ConversationRecord, NewCampaign, NewConversation, ResponseEvent,
    CONVERSATIONS_TABLE,
};
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct Tables {
    conversations: Vec<ConversationRecord>,
    campaigns: Vec<Campaign>,
    waitlist: Vec<String>,
    next_conversation_id: i64,
    next_campaign_id: i64,
}

/// Record store that keeps all tables in process memory
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    events: broadcast::Sender<ResponseEvent>,
    fail_inserts: AtomicBool,
    fail_reads: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            tables: Mutex::new(Tables::default()),
            events,
            fail_inserts: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent insert fail until switched off
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read or list fail until switched off
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_insert(&self) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(MarketaError::Store("insert rejected".to_string()).into());
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MarketaError::Store("read failed".to_string()).into());
        }
        Ok(())
    }

    /// Fill in a conversation's response, as the external writer would
    ///
    /// # Errors
    ///
    /// Returns error if the record does not exist or already has a
    /// response; a response is written at most once.
    pub fn set_response(&self, id: i64, response: impl Into<String>) -> Result<()> {
        {
            let mut tables = self.tables();
            let record = tables
                .conversations
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| MarketaError::Store(format!("conversation {} not found", id)))?;

            if record.response.is_some() {
                return Err(MarketaError::Store(format!(
                    "conversation {} already has a response",
                    id
                ))
                .into());
            }
            record.response = Some(response.into());
        }

        // No subscribers is fine.
        let _ = self.events.send(ResponseEvent {
            table: CONVERSATIONS_TABLE.to_string(),
            id,
        });
        tracing::debug!("Response written for conversation {}", id);
        Ok(())
    }

    /// Snapshot of all conversation records
    pub fn conversations(&self) -> Vec<ConversationRecord> {
        self.tables().conversations.clone()
    }

    /// Snapshot of all waitlist emails
    pub fn waitlist(&self) -> Vec<String> {
        self.tables().waitlist.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_conversation(&self, new: NewConversation) -> Result<ConversationRecord> {
        self.check_insert()?;
        let mut tables = self.tables();
        tables.next_conversation_id += 1;
        let record = ConversationRecord {
            id: tables.next_conversation_id,
            prompt: new.prompt,
            response: new.response,
            user_id: new.user_id,
            campaign_id: new.campaign_id,
            created_at: Utc::now(),
        };
        tables.conversations.push(record.clone());
        Ok(record)
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<ConversationRecord>> {
        self.check_read()?;
        Ok(self
            .tables()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        campaign_id: Option<i64>,
    ) -> Result<Vec<ConversationRecord>> {
        self.check_read()?;
        // Insertion order is creation order.
        Ok(self
            .tables()
            .conversations
            .iter()
            .filter(|c| c.user_id.as_deref() == Some(user_id))
            .filter(|c| campaign_id.is_none() || c.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        self.check_insert()?;
        let mut tables = self.tables();
        tables.next_campaign_id += 1;
        let campaign = Campaign {
            id: tables.next_campaign_id,
            name: new.name,
            objective: new.objective,
            status: new.status,
            budget_total: new.budget_total,
            channels: new.channels,
            strategy_prompt: new.strategy_prompt,
            user_id: new.user_id,
            created_at: Utc::now(),
        };
        tables.campaigns.push(campaign.clone());
        Ok(campaign)
    }

    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        self.check_read()?;
        Ok(self.tables().campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn list_campaigns(&self, user_id: &str) -> Result<Vec<Campaign>> {
        self.check_read()?;
        Ok(self
            .tables()
            .campaigns
            .iter()
            .rev()
            .filter(|c| c.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn update_campaign_status(&self, id: i64, status: CampaignStatus) -> Result<Campaign> {
        self.check_insert()?;
        let mut tables = self.tables();
        let campaign = tables
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| MarketaError::Store(format!("campaign {} not found", id)))?;
        campaign.status = status;
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, id: i64) -> Result<()> {
        self.check_insert()?;
        self.tables().campaigns.retain(|c| c.id != id);
        Ok(())
    }

    async fn insert_waitlist_email(&self, email: &str) -> Result<()> {
        self.check_insert()?;
        self.tables().waitlist.push(email.to_string());
        Ok(())
    }

    fn response_events(&self) -> Option<broadcast::Receiver<ResponseEvent>> {
        Some(self.events.subscribe())
    }
}
