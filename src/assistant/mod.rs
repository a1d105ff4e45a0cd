//! Assistant request/response exchange
//!
//! A turn is one prompt plus its eventual reply. The reply is produced by
//! an external process, so a turn either polls the stored conversation
//! record until its response appears ([`PollingExchange`]) or consumes a
//! streamed reply from the generation endpoint ([`StreamingExchange`]).
//! [`AssistantSession`] owns the transcript and drives one turn at a time
//! through whichever [`Exchange`] it was built with.

use crate::config::{AssistantMode, Config};
use crate::error::Result;
use crate::notice::Notice;
use crate::store::RecordStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

pub mod polling;
pub mod session;
pub mod sse;
pub mod streaming;
pub mod transcript;

pub use polling::{PollingExchange, TIMEOUT_MESSAGE};
pub use session::{AssistantSession, TurnOutcome};
pub use sse::{SseDecoder, SseEvent};
pub use streaming::StreamingExchange;
pub use transcript::{reconcile, Message, PendingTurn, Transcript};

/// Per-turn state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Sending,
    AwaitingResponse,
    Completed,
    TimedOut,
    Failed,
}

impl TurnState {
    /// Input is accepted only while idle
    pub fn accepts_input(&self) -> bool {
        matches!(self, TurnState::Idle)
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Idle => "idle",
            TurnState::Sending => "sending",
            TurnState::AwaitingResponse => "awaiting response",
            TurnState::Completed => "completed",
            TurnState::TimedOut => "timed out",
            TurnState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Progress of a turn, for rendering
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    StateChanged(TurnState),
    MessageAppended(Message),
    /// Text appended to a message in place
    DeltaAppended {
        id: String,
        delta: String,
    },
    /// A message's full content was replaced
    MessageUpdated {
        id: String,
        content: String,
    },
    MessageRemoved {
        id: String,
    },
    Notice(Notice),
}

/// What an exchange needs to know about the turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub prompt: String,
    /// Transcript before this turn's prompt
    pub history: Vec<Message>,
    pub owner: String,
    pub campaign_id: Option<i64>,
}

/// A completed reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Stored conversation record holding the turn
    pub record_id: Option<i64>,
    pub content: String,
}

/// Handle an exchange uses to reveal its reply
///
/// All of a turn's reply text goes to a single assistant message created
/// on first use, so every delta lands on the same id.
pub struct ReplySink<'a> {
    transcript: &'a mut Transcript,
    state: &'a mut TurnState,
    events: Option<&'a mpsc::UnboundedSender<TurnEvent>>,
    reply_id: Option<String>,
}

impl<'a> ReplySink<'a> {
    pub(crate) fn new(
        transcript: &'a mut Transcript,
        state: &'a mut TurnState,
        events: Option<&'a mpsc::UnboundedSender<TurnEvent>>,
    ) -> Self {
        Self {
            transcript,
            state,
            events,
            reply_id: None,
        }
    }

    fn emit(&self, event: TurnEvent) {
        if let Some(events) = self.events {
            // The renderer may have gone away; the turn carries on.
            let _ = events.send(event);
        }
    }

    /// The request is durably accepted and the reply is outstanding
    pub fn awaiting(&mut self, record_id: Option<i64>) {
        if let Some(id) = record_id {
            tracing::debug!("Awaiting response for conversation {}", id);
        }
        *self.state = TurnState::AwaitingResponse;
        self.emit(TurnEvent::StateChanged(TurnState::AwaitingResponse));
    }

    /// Create the assistant message if it does not exist yet
    pub fn begin(&mut self) -> String {
        if let Some(id) = &self.reply_id {
            return id.clone();
        }
        let message = Message::placeholder();
        let id = message.id.clone();
        self.transcript.push(message.clone());
        self.emit(TurnEvent::MessageAppended(message));
        self.reply_id = Some(id.clone());
        id
    }

    /// Append reply text
    pub fn append(&mut self, delta: &str) {
        let id = self.begin();
        self.transcript.append_delta(&id, delta);
        self.emit(TurnEvent::DeltaAppended {
            id,
            delta: delta.to_string(),
        });
    }

    /// Replace the reply text
    pub fn set(&mut self, content: &str) {
        let id = self.begin();
        self.transcript.update(&id, content);
        self.emit(TurnEvent::MessageUpdated {
            id,
            content: content.to_string(),
        });
    }

    /// Current reply text, if the reply message exists
    pub fn content(&self) -> Option<&str> {
        let id = self.reply_id.as_deref()?;
        self.transcript.get(id).map(|m| m.content.as_str())
    }

    pub(crate) fn into_reply_id(self) -> Option<String> {
        self.reply_id
    }
}

/// One way of turning a prompt into a reply
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Run the turn, revealing the reply through `reply`
    ///
    /// # Errors
    ///
    /// Any error fails the turn; a [`crate::error::MarketaError::Timeout`]
    /// marks it timed out instead.
    async fn exchange(&self, request: &TurnRequest, reply: &mut ReplySink<'_>) -> Result<Reply>;
}

/// Build the exchange selected by the configuration
///
/// Streaming calls the generation endpoint with `access_token` as the
/// bearer credential.
pub fn build_exchange(
    config: &Config,
    store: Arc<dyn RecordStore>,
    access_token: &str,
) -> Result<Arc<dyn Exchange>> {
    match config.assistant.mode {
        AssistantMode::Polling => Ok(Arc::new(PollingExchange::from_config(
            store,
            &config.assistant,
        ))),
        AssistantMode::Streaming => Ok(Arc::new(StreamingExchange::new(
            config,
            store,
            access_token,
        )?)),
    }
}
