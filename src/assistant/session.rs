//! One user's assistant conversation

use crate::assistant::transcript::{reconcile, Message, Transcript};
use crate::assistant::{Exchange, ReplySink, TurnEvent, TurnRequest, TurnState};
use crate::error::{MarketaError, Result};
use crate::notice::Notice;
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How a call to [`AssistantSession::send`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Nothing was sent: empty input or no campaign selected
    Ignored,
    Completed {
        record_id: Option<i64>,
        reply: String,
    },
    TimedOut,
    Failed(String),
}

/// Transcript plus the machinery to run turns against it
///
/// `send` takes `&mut self`, so a session runs at most one turn at a time
/// and the transcript has a single writer.
pub struct AssistantSession {
    store: Arc<dyn RecordStore>,
    exchange: Arc<dyn Exchange>,
    owner: String,
    campaign_id: Option<i64>,
    require_campaign: bool,
    transcript: Transcript,
    state: TurnState,
    events: Option<mpsc::UnboundedSender<TurnEvent>>,
}

impl AssistantSession {
    pub fn new(
        store: Arc<dyn RecordStore>,
        exchange: Arc<dyn Exchange>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            store,
            exchange,
            owner: owner.into(),
            campaign_id: None,
            require_campaign: false,
            transcript: Transcript::new(),
            state: TurnState::Idle,
            events: None,
        }
    }

    /// Scope the conversation to a campaign
    pub fn with_campaign(mut self, campaign_id: Option<i64>) -> Self {
        self.campaign_id = campaign_id;
        self
    }

    /// Refuse to send until a campaign is selected
    pub fn require_campaign(mut self, required: bool) -> Self {
        self.require_campaign = required;
        self
    }

    /// Report progress on `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TurnEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn campaign_id(&self) -> Option<i64> {
        self.campaign_id
    }

    /// Switch campaigns; the transcript is cleared
    pub fn select_campaign(&mut self, campaign_id: Option<i64>) {
        if self.campaign_id != campaign_id {
            self.campaign_id = campaign_id;
            self.transcript.clear();
        }
    }

    /// Switch campaigns and load the new campaign's stored conversation
    ///
    /// Returns the number of messages loaded.
    pub async fn switch_campaign(&mut self, campaign_id: Option<i64>) -> Result<usize> {
        self.select_campaign(campaign_id);
        self.load_history().await
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    fn emit(&self, event: TurnEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn set_state(&mut self, state: TurnState) {
        self.state = state;
        self.emit(TurnEvent::StateChanged(state));
    }

    fn push(&mut self, message: Message) {
        self.transcript.push(message.clone());
        self.emit(TurnEvent::MessageAppended(message));
    }

    /// Rebuild the transcript from stored records
    ///
    /// Returns the number of messages loaded.
    pub async fn load_history(&mut self) -> Result<usize> {
        let records = self
            .store
            .list_conversations(&self.owner, self.campaign_id)
            .await?;
        self.transcript = Transcript::from_messages(reconcile(&records, None));
        tracing::debug!(
            "Loaded {} records into {} messages",
            records.len(),
            self.transcript.len()
        );
        Ok(self.transcript.len())
    }

    /// Run one turn
    ///
    /// Blank input, or a missing campaign when one is required, sends
    /// nothing. Otherwise the prompt is shown immediately and the reply is
    /// revealed as the exchange produces it. A failed turn leaves exactly
    /// one inline error message and raises a destructive notice; the
    /// session is idle again either way.
    pub async fn send(&mut self, input: &str) -> TurnOutcome {
        let prompt = input.trim();
        if prompt.is_empty() {
            return TurnOutcome::Ignored;
        }
        if !self.state.accepts_input() {
            self.recover_abandoned_turn();
        }
        if self.require_campaign && self.campaign_id.is_none() {
            tracing::debug!("No campaign selected; not sending");
            return TurnOutcome::Ignored;
        }

        let request = TurnRequest {
            prompt: prompt.to_string(),
            history: self.transcript.messages().to_vec(),
            owner: self.owner.clone(),
            campaign_id: self.campaign_id,
        };

        self.push(Message::user(prompt));
        self.set_state(TurnState::Sending);

        let exchange = Arc::clone(&self.exchange);
        let (result, reply_id) = {
            let mut sink =
                ReplySink::new(&mut self.transcript, &mut self.state, self.events.as_ref());
            let result = exchange.exchange(&request, &mut sink).await;
            (result, sink.into_reply_id())
        };

        let outcome = match result {
            Ok(reply) => {
                tracing::info!("Turn completed ({} chars)", reply.content.len());
                self.set_state(TurnState::Completed);
                TurnOutcome::Completed {
                    record_id: reply.record_id,
                    reply: reply.content,
                }
            }
            Err(e) => self.fail_turn(e, reply_id),
        };

        self.set_state(TurnState::Idle);
        outcome
    }

    /// Clean up after a turn whose `send` future was dropped
    ///
    /// The empty reply placeholder it may have left is removed and the
    /// session is idle again. Partial replies stay.
    fn recover_abandoned_turn(&mut self) {
        tracing::warn!("Previous turn was abandoned in state {}", self.state);
        let stale: Vec<String> = self
            .transcript
            .messages()
            .iter()
            .filter(|m| !m.is_user && !m.is_error() && m.content.is_empty())
            .map(|m| m.id.clone())
            .collect();
        for id in stale {
            self.transcript.remove(&id);
            self.emit(TurnEvent::MessageRemoved { id });
        }
        self.set_state(TurnState::Idle);
    }

    fn fail_turn(&mut self, error: anyhow::Error, reply_id: Option<String>) -> TurnOutcome {
        let timed_out = matches!(
            error.downcast_ref::<MarketaError>(),
            Some(MarketaError::Timeout { .. })
        );
        let description = error.to_string();
        tracing::error!("Turn failed: {}", description);

        if let Some(id) = reply_id {
            let empty = self
                .transcript
                .get(&id)
                .map(|m| m.content.is_empty())
                .unwrap_or(false);
            if empty {
                self.transcript.remove(&id);
                self.emit(TurnEvent::MessageRemoved { id });
            }
        }

        self.push(Message::error(&description));
        self.emit(TurnEvent::Notice(Notice::destructive(
            "Error",
            description.clone(),
        )));

        if timed_out {
            self.set_state(TurnState::TimedOut);
            TurnOutcome::TimedOut
        } else {
            self.set_state(TurnState::Failed);
            TurnOutcome::Failed(description)
        }
    }
}
