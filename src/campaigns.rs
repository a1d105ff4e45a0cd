//! Campaign operations for one owner

use crate::error::{MarketaError, Result};
use crate::store::{Campaign, CampaignStatus, NewCampaign, RecordStore};
use std::sync::Arc;

/// Campaign store scoped to a signed-in owner
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use marketa::campaigns::CampaignService;
/// use marketa::store::{CampaignStatus, Channel, MemoryStore, NewCampaign, Objective};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let service = CampaignService::new(Arc::new(MemoryStore::new()), "user-1");
/// let created = service
///     .create(NewCampaign {
///         name: "Spring Sale".to_string(),
///         objective: Objective::Sales,
///         status: CampaignStatus::Draft,
///         budget_total: None,
///         channels: vec![Channel::Email],
///         strategy_prompt: None,
///         user_id: None,
///     })
///     .await?;
///
/// assert_eq!(created.user_id.as_deref(), Some("user-1"));
/// assert_eq!(service.list().await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CampaignService {
    store: Arc<dyn RecordStore>,
    owner: String,
}

impl CampaignService {
    pub fn new(store: Arc<dyn RecordStore>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The owner's campaigns, newest first
    pub async fn list(&self) -> Result<Vec<Campaign>> {
        self.store.list_campaigns(&self.owner).await
    }

    /// A campaign by id, or `None` when it does not exist
    pub async fn get(&self, id: i64) -> Result<Option<Campaign>> {
        self.store.get_campaign(id).await
    }

    /// Create a campaign owned by this owner
    ///
    /// # Errors
    ///
    /// Returns a validation error when the trimmed name is empty
    pub async fn create(&self, mut new: NewCampaign) -> Result<Campaign> {
        new.name = new.name.trim().to_string();
        if new.name.is_empty() {
            return Err(MarketaError::Validation("Campaign name is required".to_string()).into());
        }

        new.channels.sort();
        new.channels.dedup();
        new.user_id = Some(self.owner.clone());

        let campaign = self.store.insert_campaign(new).await?;
        tracing::info!("Created campaign {} ({})", campaign.id, campaign.name);
        Ok(campaign)
    }

    pub async fn set_status(&self, id: i64, status: CampaignStatus) -> Result<Campaign> {
        let campaign = self.store.update_campaign_status(id, status).await?;
        tracing::info!("Campaign {} is now {}", id, status);
        Ok(campaign)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete_campaign(id).await?;
        tracing::info!("Deleted campaign {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Channel, MemoryStore, Objective};

    fn service() -> CampaignService {
        CampaignService::new(Arc::new(MemoryStore::new()), "owner-1")
    }

    fn new_campaign(name: &str, channels: Vec<Channel>) -> NewCampaign {
        NewCampaign {
            name: name.to_string(),
            objective: Objective::Leads,
            status: CampaignStatus::Draft,
            budget_total: Some(100.0),
            channels,
            strategy_prompt: None,
            user_id: Some("someone-else".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let service = service();
        let err = service.create(new_campaign("   ", vec![])).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MarketaError>(),
            Some(MarketaError::Validation(_))
        ));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_sets_owner_and_dedups_channels() {
        let service = service();
        let created = service
            .create(new_campaign(
                " Launch ",
                vec![Channel::Google, Channel::Email, Channel::Google],
            ))
            .await
            .unwrap();

        assert_eq!(created.name, "Launch");
        assert_eq!(created.user_id.as_deref(), Some("owner-1"));
        assert_eq!(created.channels, vec![Channel::Email, Channel::Google]);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        assert!(service().get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_and_delete() {
        let service = service();
        let created = service
            .create(new_campaign("Launch", vec![Channel::X]))
            .await
            .unwrap();

        let paused = service
            .set_status(created.id, CampaignStatus::Paused)
            .await
            .unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);

        service.delete(created.id).await.unwrap();
        assert!(service.get(created.id).await.unwrap().is_none());
    }
}
