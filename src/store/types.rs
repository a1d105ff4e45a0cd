//! Record types shared by every `RecordStore` implementation
//!
//! Field names on the wire follow the hosted tables (`Conversations`,
//! `Campaigns`, `Emails`), which is why a few of them are renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Table holding prompt/response pairs
pub const CONVERSATIONS_TABLE: &str = "Conversations";
/// Table holding campaign configurations
pub const CAMPAIGNS_TABLE: &str = "Campaigns";
/// Table holding waitlist signups
pub const WAITLIST_TABLE: &str = "Emails";

/// A stored prompt/response pair
///
/// Created with `response = None`; one external writer later sets the
/// response exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Server-assigned ordinal id
    pub id: i64,
    /// The user's prompt
    #[serde(rename = "Prompt")]
    pub prompt: String,
    /// Generated reply, null until the external writer fills it
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
    /// Owner reference
    #[serde(default)]
    pub user_id: Option<String>,
    /// Optional campaign scope
    #[serde(default)]
    pub campaign_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// True once the external writer has produced a non-empty reply
    pub fn has_response(&self) -> bool {
        self.response.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Insert payload for a conversation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversation {
    /// The user's prompt
    #[serde(rename = "Prompt")]
    pub prompt: String,
    /// Reply, `None` for the polling variant, filled for the streaming variant
    #[serde(rename = "Response")]
    pub response: Option<String>,
    /// Owner reference
    pub user_id: Option<String>,
    /// Optional campaign scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<i64>,
}

/// Published when a conversation's response goes from null to non-null
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEvent {
    /// Table the record lives in
    pub table: String,
    /// Record id
    pub id: i64,
}

/// Campaign objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Brand awareness
    #[default]
    Awareness,
    /// Website traffic
    Traffic,
    /// Lead generation
    Leads,
    /// Sales
    Sales,
    /// Customer retention
    Retention,
    /// Anything else
    Custom,
}

impl Objective {
    /// All objectives in display order
    pub const ALL: [Objective; 6] = [
        Objective::Awareness,
        Objective::Traffic,
        Objective::Leads,
        Objective::Sales,
        Objective::Retention,
        Objective::Custom,
    ];

    /// Parse an objective from its wire name
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::store::Objective;
    ///
    /// assert_eq!(Objective::parse_str("Leads").unwrap(), Objective::Leads);
    /// assert!(Objective::parse_str("virality").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "awareness" => Ok(Self::Awareness),
            "traffic" => Ok(Self::Traffic),
            "leads" => Ok(Self::Leads),
            "sales" => Ok(Self::Sales),
            "retention" => Ok(Self::Retention),
            "custom" => Ok(Self::Custom),
            other => Err(format!("Unknown objective: {}", other)),
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Awareness => "Brand Awareness",
            Self::Traffic => "Website Traffic",
            Self::Leads => "Leads",
            Self::Sales => "Sales",
            Self::Retention => "Retention",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Awareness => "awareness",
            Self::Traffic => "traffic",
            Self::Leads => "leads",
            Self::Sales => "sales",
            Self::Retention => "retention",
            Self::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Not yet running
    #[default]
    Draft,
    /// Running
    Active,
    /// Temporarily stopped
    Paused,
}

impl CampaignStatus {
    /// Parse a status from its wire name
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            other => Err(format!("Unknown campaign status: {}", other)),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// Marketing channel a campaign runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Facebook,
    Google,
    Linkedin,
    Instagram,
    Tiktok,
    X,
}

impl Channel {
    /// All channels in display order
    pub const ALL: [Channel; 7] = [
        Channel::Email,
        Channel::Facebook,
        Channel::Google,
        Channel::Linkedin,
        Channel::Instagram,
        Channel::Tiktok,
        Channel::X,
    ];

    /// Parse a channel from its wire name
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::store::Channel;
    ///
    /// assert_eq!(Channel::parse_str("google").unwrap(), Channel::Google);
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "facebook" => Ok(Self::Facebook),
            "google" => Ok(Self::Google),
            "linkedin" => Ok(Self::Linkedin),
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::Tiktok),
            "x" => Ok(Self::X),
            other => Err(format!("Unknown channel: {}", other)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Email => "email",
            Self::Facebook => "facebook",
            Self::Google => "google",
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::X => "x",
        };
        write!(f, "{}", s)
    }
}

/// A stored campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Server-assigned id
    pub id: i64,
    /// Campaign name, never empty
    pub name: String,
    /// Objective
    pub objective: Objective,
    /// Lifecycle status
    pub status: CampaignStatus,
    /// Optional total budget
    #[serde(default)]
    pub budget_total: Option<f64>,
    /// Selected channels
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Free-text strategy notes
    #[serde(default)]
    pub strategy_prompt: Option<String>,
    /// Owner reference
    #[serde(default)]
    pub user_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub objective: Objective,
    pub status: CampaignStatus,
    pub budget_total: Option<f64>,
    pub channels: Vec<Channel>,
    pub strategy_prompt: Option<String>,
    pub user_id: Option<String>,
}

/// A waitlist signup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    #[serde(rename = "Email")]
    pub email: String,
}
