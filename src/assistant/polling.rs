//! Polling exchange
//!
//! Writes the prompt as a conversation record with no response, then
//! re-reads that record at a fixed interval until an external writer has
//! filled in the response or the attempt budget runs out. When the store
//! can announce response writes, each wait ends early on a matching
//! announcement instead of sleeping out the full interval.

use crate::assistant::{Exchange, Reply, ReplySink, TurnRequest};
use crate::config::AssistantConfig;
use crate::error::{MarketaError, Result};
use crate::store::{NewConversation, RecordStore, ResponseEvent, CONVERSATIONS_TABLE};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

/// Shown when the attempt budget is exhausted
pub const TIMEOUT_MESSAGE: &str =
    "Response timeout. The AI may still be processing your request.";

/// Exchange that polls the stored record for its response
pub struct PollingExchange {
    store: Arc<dyn RecordStore>,
    interval: Duration,
    max_attempts: u32,
}

impl PollingExchange {
    pub fn new(store: Arc<dyn RecordStore>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            store,
            interval,
            max_attempts,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &AssistantConfig) -> Self {
        Self::new(store, config.poll_interval(), config.max_poll_attempts)
    }

    /// Wait for conversation `id` to get its response
    ///
    /// Each attempt waits one interval and then re-reads the record, so
    /// the ceiling is `max_attempts * interval`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketaError::Timeout`] when the budget runs out, or the
    /// store's error when a re-read fails.
    pub async fn wait_for_response(&self, id: i64) -> Result<String> {
        let mut events = self.store.response_events();

        for attempt in 1..=self.max_attempts {
            self.wait_interval(&mut events, id).await;

            let record = self.store.get_conversation(id).await.map_err(|e| {
                tracing::error!("Polling conversation {} failed: {}", id, e);
                e
            })?;

            match record {
                Some(record) if record.has_response() => {
                    tracing::debug!("Response for conversation {} after {} attempts", id, attempt);
                    return Ok(record.response.unwrap_or_default());
                }
                Some(_) => {
                    tracing::trace!("Attempt {}/{}: no response yet", attempt, self.max_attempts);
                }
                None => {
                    tracing::warn!("Conversation {} not visible yet", id);
                }
            }
        }

        tracing::warn!(
            "No response for conversation {} after {} attempts",
            id,
            self.max_attempts
        );
        Err(MarketaError::Timeout {
            attempts: self.max_attempts,
            message: TIMEOUT_MESSAGE.to_string(),
        }
        .into())
    }

    async fn wait_interval(
        &self,
        events: &mut Option<broadcast::Receiver<ResponseEvent>>,
        id: i64,
    ) {
        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);

        let Some(rx) = events.as_mut() else {
            sleep.await;
            return;
        };

        let closed = loop {
            tokio::select! {
                _ = &mut sleep => return,
                event = rx.recv() => match event {
                    Ok(event) if event.table == CONVERSATIONS_TABLE && event.id == id => return,
                    Ok(_) => {}
                    // Missed announcements; re-read now rather than guess.
                    Err(RecvError::Lagged(_)) => return,
                    Err(RecvError::Closed) => break true,
                },
            }
        };

        if closed {
            *events = None;
            sleep.await;
        }
    }
}

#[async_trait]
impl Exchange for PollingExchange {
    async fn exchange(&self, request: &TurnRequest, reply: &mut ReplySink<'_>) -> Result<Reply> {
        let record = self
            .store
            .insert_conversation(NewConversation {
                prompt: request.prompt.clone(),
                response: None,
                user_id: Some(request.owner.clone()),
                campaign_id: request.campaign_id,
            })
            .await?;

        reply.awaiting(Some(record.id));
        reply.begin();

        let content = self.wait_for_response(record.id).await?;
        reply.set(&content);

        Ok(Reply {
            record_id: Some(record.id),
            content,
        })
    }
}
