//! Record store abstraction over the hosted tables
//!
//! The hosted service owns all persistent state. The client only needs
//! insert-returning-id, read-by-id and owner/campaign filtered listing for
//! conversations, plus a small CRUD surface for campaigns and the waitlist.
//!
//! Two implementations ship with the crate:
//!
//! - [`RestStore`]: talks to the hosted REST interface
//! - [`MemoryStore`]: in-process tables for tests and demos

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

pub mod memory;
pub mod rest;
pub mod types;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use types::{
    Campaign, CampaignStatus, Channel, ConversationRecord, NewCampaign, NewConversation,
    Objective, ResponseEvent, WaitlistEntry, CAMPAIGNS_TABLE, CONVERSATIONS_TABLE,
    WAITLIST_TABLE,
};

/// Access to the hosted record tables
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a conversation record and return it with its assigned id
    async fn insert_conversation(&self, new: NewConversation) -> Result<ConversationRecord>;

    /// Read a conversation record by id
    async fn get_conversation(&self, id: i64) -> Result<Option<ConversationRecord>>;

    /// List an owner's conversations, optionally scoped to one campaign,
    /// oldest first
    async fn list_conversations(
        &self,
        user_id: &str,
        campaign_id: Option<i64>,
    ) -> Result<Vec<ConversationRecord>>;

    /// Insert a campaign and return it with its assigned id
    async fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign>;

    /// Read a campaign by id
    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>>;

    /// List an owner's campaigns, newest first
    async fn list_campaigns(&self, user_id: &str) -> Result<Vec<Campaign>>;

    /// Change a campaign's status
    async fn update_campaign_status(&self, id: i64, status: CampaignStatus) -> Result<Campaign>;

    /// Delete a campaign
    async fn delete_campaign(&self, id: i64) -> Result<()>;

    /// Record a waitlist email
    async fn insert_waitlist_email(&self, email: &str) -> Result<()>;

    /// Subscribe to response transitions, if this store can push them
    ///
    /// Stores without a push channel return `None` and callers fall back
    /// to fixed-interval polling.
    fn response_events(&self) -> Option<broadcast::Receiver<ResponseEvent>> {
        None
    }
}
