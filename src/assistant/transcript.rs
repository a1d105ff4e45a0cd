//! Client-side transcript
//!
//! Messages only live in memory. They are rebuilt from conversation
//! records on load with [`reconcile`], or appended optimistically while a
//! turn is in flight.

use crate::store::ConversationRecord;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One transcript entry
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(id: String, content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id,
            content: content.into(),
            is_user,
            timestamp: Utc::now(),
        }
    }

    /// Optimistic user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(format!("user-{}", Uuid::new_v4()), content, true)
    }

    /// Empty assistant message that a reply is revealed into
    pub fn placeholder() -> Self {
        Self::new(format!("assistant-{}", Uuid::new_v4()), String::new(), false)
    }

    /// Inline error shown in place of a reply
    pub fn error(description: impl std::fmt::Display) -> Self {
        Self::new(
            format!("error-{}", Uuid::new_v4()),
            format!("Error: {}", description),
            false,
        )
    }

    pub fn is_error(&self) -> bool {
        self.id.starts_with("error-")
    }

    /// The prompt half of a stored record
    pub fn from_prompt(record: &ConversationRecord) -> Self {
        Self {
            id: format!("prompt-{}", record.id),
            content: record.prompt.clone(),
            is_user: true,
            timestamp: record.created_at,
        }
    }

    /// The response half of a stored record, if it has one
    pub fn from_response(record: &ConversationRecord) -> Option<Self> {
        if !record.has_response() {
            return None;
        }
        Some(Self {
            id: format!("response-{}", record.id),
            content: record.response.clone().unwrap_or_default(),
            is_user: false,
            timestamp: record.created_at,
        })
    }
}

/// Ordered list of messages
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace a message's content; returns `false` if the id is unknown
    pub fn update(&mut self, id: &str, content: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.content = content.to_string();
                true
            }
            None => false,
        }
    }

    /// Append to a message's content; returns `false` if the id is unknown
    pub fn append_delta(&mut self, id: &str, delta: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.content.push_str(delta);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// A turn that has been shown but may not be fully stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    /// The optimistic user message
    pub prompt: Message,
    /// Id of the stored record once the prompt was written
    pub record_id: Option<i64>,
    /// The assistant message being revealed, if any
    pub reply: Option<Message>,
}

/// Merge stored records with an in-flight turn into the visible transcript
///
/// Each record contributes its prompt and, once set, its response, in
/// record order. The pending turn's messages are appended after them,
/// except for whatever the stored record for that turn already shows: a
/// stored prompt replaces the optimistic one, and a stored response
/// replaces the pending reply.
///
/// # Examples
///
/// ```
/// use marketa::assistant::{reconcile, Message, PendingTurn};
///
/// let pending = PendingTurn {
///     prompt: Message::user("hello"),
///     record_id: None,
///     reply: Some(Message::placeholder()),
/// };
/// let view = reconcile(&[], Some(&pending));
/// assert_eq!(view.len(), 2);
/// assert!(view[0].is_user);
/// ```
pub fn reconcile(records: &[ConversationRecord], pending: Option<&PendingTurn>) -> Vec<Message> {
    let mut view = Vec::with_capacity(records.len() * 2 + 2);
    for record in records {
        view.push(Message::from_prompt(record));
        if let Some(response) = Message::from_response(record) {
            view.push(response);
        }
    }

    let Some(pending) = pending else {
        return view;
    };

    let stored = pending
        .record_id
        .and_then(|id| records.iter().find(|r| r.id == id));

    match stored {
        Some(record) if record.has_response() => {}
        Some(_) => view.extend(pending.reply.iter().cloned()),
        None => {
            view.push(pending.prompt.clone());
            view.extend(pending.reply.iter().cloned());
        }
    }

    view
}
