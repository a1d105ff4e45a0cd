//! Streaming exchange
//!
//! Sends the prior transcript plus the new prompt to the generation
//! endpoint and reveals the reply as its event stream arrives. The turn is
//! stored afterwards as a single conversation record holding both the
//! prompt and the assembled reply.

use crate::assistant::sse::{SseDecoder, SseEvent};
use crate::assistant::{Exchange, Reply, ReplySink, TurnRequest};
use crate::config::Config;
use crate::error::{MarketaError, Result};
use crate::store::{NewConversation, RecordStore};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    campaign_id: Option<i64>,
}

impl<'a> ChatRequest<'a> {
    fn from_turn(request: &'a TurnRequest) -> Self {
        let mut messages: Vec<ChatMessage<'a>> = request
            .history
            .iter()
            .filter(|m| !m.is_error() && !m.content.is_empty())
            .map(|m| ChatMessage {
                role: if m.is_user { "user" } else { "assistant" },
                content: &m.content,
            })
            .collect();
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        Self {
            messages,
            campaign_id: request.campaign_id,
        }
    }
}

/// Decode a reply body, revealing each delta as it arrives
///
/// Reading stops at the end sentinel or when the body ends. Returns the
/// assembled reply, which is exactly the concatenation of the deltas.
pub async fn read_reply_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    reply: &mut ReplySink<'_>,
) -> Result<String> {
    let mut decoder = SseDecoder::new();
    let mut content = String::new();

    tokio::pin!(byte_stream);

    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk.map_err(|e| MarketaError::Stream(format!("Reply stream failed: {}", e)))?;
        for event in decoder.push(&chunk) {
            if let SseEvent::Delta(delta) = event {
                content.push_str(&delta);
                reply.append(&delta);
            }
        }
        if decoder.is_done() {
            break;
        }
    }

    for event in decoder.finish() {
        if let SseEvent::Delta(delta) = event {
            content.push_str(&delta);
            reply.append(&delta);
        }
    }

    Ok(content)
}

/// Exchange backed by the streaming generation endpoint
pub struct StreamingExchange {
    client: Client,
    url: String,
    anon_key: String,
    access_token: String,
    store: Arc<dyn RecordStore>,
}

impl StreamingExchange {
    /// Create an exchange that authenticates with `access_token`
    ///
    /// No request timeout is applied: the stream lasts as long as the
    /// endpoint keeps it open.
    pub fn new(config: &Config, store: Arc<dyn RecordStore>, access_token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("marketa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MarketaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.stream_url(),
            anon_key: config.backend.anon_key.clone(),
            access_token: access_token.to_string(),
            store,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::error!("Assistant endpoint returned {}", status);
        let error = match status {
            StatusCode::TOO_MANY_REQUESTS => MarketaError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => MarketaError::PaymentRequired,
            _ => MarketaError::Endpoint {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            },
        };
        Err(error.into())
    }
}

#[async_trait]
impl Exchange for StreamingExchange {
    async fn exchange(&self, request: &TurnRequest, reply: &mut ReplySink<'_>) -> Result<Reply> {
        let body = ChatRequest::from_turn(request);
        tracing::debug!(
            "Streaming turn to {} with {} messages",
            self.url,
            body.messages.len()
        );

        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        reply.awaiting(None);
        reply.begin();

        let content = read_reply_stream(response.bytes_stream(), reply).await?;

        if content.trim().is_empty() {
            return Err(
                MarketaError::Stream("The assistant returned an empty response".to_string()).into(),
            );
        }

        let record = self
            .store
            .insert_conversation(NewConversation {
                prompt: request.prompt.clone(),
                response: Some(content.clone()),
                user_id: Some(request.owner.clone()),
                campaign_id: request.campaign_id,
            })
            .await?;
        tracing::info!("Stored streamed turn as conversation {}", record.id);

        Ok(Reply {
            record_id: Some(record.id),
            content,
        })
    }
}
