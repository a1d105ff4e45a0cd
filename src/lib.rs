//! Marketa - AI marketing assistant client library
//!
//! This library provides the client side of the Marketa product: the
//! waitlist, sign-in and the dashboard route gate, campaign management
//! with its creation wizard, and the assistant exchange that turns a
//! prompt into an asynchronously produced reply.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `store`: Record store abstraction over the hosted tables (REST and in-memory)
//! - `auth`: Auth service client, cached session and route gate
//! - `waitlist`: Waitlist capture
//! - `campaigns`: Campaign operations scoped to an owner
//! - `wizard`: Three-step campaign creation wizard
//! - `assistant`: Transcript, polling and streaming exchanges, assistant session
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use marketa::assistant::{AssistantSession, PollingExchange};
//! use marketa::store::{RecordStore, RestStore};
//! use marketa::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let store: Arc<dyn RecordStore> = Arc::new(RestStore::new(&config.backend)?);
//!     let exchange = Arc::new(PollingExchange::from_config(store.clone(), &config.assistant));
//!     let mut session = AssistantSession::new(store, exchange, "user-id");
//!     session.send("How do I improve email marketing?").await;
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod auth;
pub mod campaigns;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod notice;
pub mod store;
pub mod waitlist;
pub mod wizard;

// Re-export commonly used types
pub use assistant::{AssistantSession, TurnOutcome, TurnState};
pub use config::Config;
pub use error::{MarketaError, Result};
pub use notice::{Notice, NoticeVariant};
pub use wizard::CampaignWizard;
