//! Three-step campaign creation wizard
//!
//! The wizard collects a campaign over `Basics -> Channels -> Details` and
//! only lets the user move forward once the current step's required fields
//! hold. Going back never loses data; closing discards everything.
//!
//! ```
//! use std::sync::Arc;
//! use marketa::campaigns::CampaignService;
//! use marketa::store::{Channel, MemoryStore};
//! use marketa::wizard::{CampaignWizard, WizardStep};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let campaigns = CampaignService::new(Arc::new(MemoryStore::new()), "user-1");
//! let mut wizard = CampaignWizard::new();
//! wizard.open();
//!
//! wizard.set_name("Launch");
//! assert_eq!(wizard.next()?, WizardStep::Channels);
//! wizard.toggle_channel(Channel::Email);
//! assert_eq!(wizard.next()?, WizardStep::Details);
//!
//! let id = wizard.submit(&campaigns).await?;
//! assert!(!wizard.is_open());
//! assert!(campaigns.get(id).await?.is_some());
//! # Ok(())
//! # }
//! ```

use crate::campaigns::CampaignService;
use crate::error::Result;
use crate::store::{CampaignStatus, Channel, NewCampaign, Objective};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Inline validation problems shown next to the wizard's fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Campaign name is required")]
    NameRequired,

    #[error("Select at least one channel")]
    ChannelRequired,

    #[error("Budget must be a non-negative number, got '{0}'")]
    InvalidBudget(String),

    #[error("This is the last step; submit the campaign instead")]
    LastStep,

    #[error("The campaign can only be submitted from the last step")]
    NotOnLastStep,

    #[error("The wizard is closed")]
    Closed,
}

/// Wizard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Basics,
    Channels,
    Details,
}

impl WizardStep {
    /// 1-based position
    pub fn number(&self) -> u8 {
        match self {
            Self::Basics => 1,
            Self::Channels => 2,
            Self::Details => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Basics => "Basics",
            Self::Channels => "Channels",
            Self::Details => "Budget & notes",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Basics => Some(Self::Channels),
            Self::Channels => Some(Self::Details),
            Self::Details => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            Self::Basics => None,
            Self::Channels => Some(Self::Basics),
            Self::Details => Some(Self::Channels),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {} of 3: {}", self.number(), self.title())
    }
}

/// Where the wizard is
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    Editing(WizardStep),
    Submitting,
    Created(i64),
    /// The last submission failed; the wizard is still on the last step
    Failed(String),
}

/// Fields collected so far
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CampaignDraft {
    pub name: String,
    pub objective: Objective,
    pub status: CampaignStatus,
    pub budget: Option<f64>,
    pub channels: BTreeSet<Channel>,
    pub notes: String,
}

impl CampaignDraft {
    /// Insert payload for this draft
    pub fn to_new_campaign(&self) -> NewCampaign {
        let notes = self.notes.trim();
        NewCampaign {
            name: self.name.trim().to_string(),
            objective: self.objective,
            status: self.status,
            budget_total: self.budget,
            channels: self.channels.iter().copied().collect(),
            strategy_prompt: (!notes.is_empty()).then(|| notes.to_string()),
            user_id: None,
        }
    }
}

/// Parse a budget field
///
/// Empty input means "no budget".
///
/// # Examples
///
/// ```
/// use marketa::wizard::parse_budget;
///
/// assert_eq!(parse_budget("5000").unwrap(), Some(5000.0));
/// assert_eq!(parse_budget(" ").unwrap(), None);
/// assert!(parse_budget("-1").is_err());
/// ```
pub fn parse_budget(raw: &str) -> std::result::Result<Option<f64>, WizardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(WizardError::InvalidBudget(raw.to_string())),
    }
}

/// Campaign creation wizard
#[derive(Debug, Clone)]
pub struct CampaignWizard {
    state: WizardState,
    draft: CampaignDraft,
    open: bool,
}

impl Default for CampaignWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignWizard {
    /// A closed wizard with empty fields
    pub fn new() -> Self {
        Self {
            state: WizardState::Editing(WizardStep::Basics),
            draft: CampaignDraft::default(),
            open: false,
        }
    }

    /// Show the wizard at the first step
    pub fn open(&mut self) {
        self.open = true;
        self.state = WizardState::Editing(WizardStep::Basics);
    }

    /// Hide the wizard and discard everything entered
    pub fn close(&mut self) {
        self.open = false;
        self.draft = CampaignDraft::default();
        self.state = WizardState::Editing(WizardStep::Basics);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn draft(&self) -> &CampaignDraft {
        &self.draft
    }

    /// The page currently shown
    pub fn step(&self) -> WizardStep {
        match self.state {
            WizardState::Editing(step) => step,
            WizardState::Submitting | WizardState::Failed(_) => WizardStep::Details,
            WizardState::Created(_) => WizardStep::Basics,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.draft.objective = objective;
    }

    pub fn set_status(&mut self, status: CampaignStatus) {
        self.draft.status = status;
    }

    /// Select or deselect a channel; returns whether it is now selected
    pub fn toggle_channel(&mut self, channel: Channel) -> bool {
        if self.draft.channels.remove(&channel) {
            false
        } else {
            self.draft.channels.insert(channel);
            true
        }
    }

    /// Set the budget from raw input
    ///
    /// Invalid input is rejected and the previous value kept, so the
    /// details step never holds a value that would block submission.
    pub fn set_budget(&mut self, raw: &str) -> std::result::Result<(), WizardError> {
        self.draft.budget = parse_budget(raw)?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.draft.notes = notes.into();
    }

    /// Check the current step's required fields
    pub fn validate_step(&self) -> std::result::Result<(), WizardError> {
        match self.step() {
            WizardStep::Basics if self.draft.name.trim().is_empty() => {
                Err(WizardError::NameRequired)
            }
            WizardStep::Channels if self.draft.channels.is_empty() => {
                Err(WizardError::ChannelRequired)
            }
            _ => Ok(()),
        }
    }

    /// Advance to the next step
    pub fn next(&mut self) -> std::result::Result<WizardStep, WizardError> {
        if !self.open {
            return Err(WizardError::Closed);
        }
        self.validate_step()?;
        let next = self.step().next().ok_or(WizardError::LastStep)?;
        self.state = WizardState::Editing(next);
        Ok(next)
    }

    /// Go back one step; stays put on the first step
    pub fn back(&mut self) -> WizardStep {
        let step = self.step().previous().unwrap_or(WizardStep::Basics);
        self.state = WizardState::Editing(step);
        step
    }

    /// Create the campaign
    ///
    /// On success the wizard resets, closes and returns the new id. On
    /// failure it stays open on the last step with all fields intact.
    pub async fn submit(&mut self, campaigns: &CampaignService) -> Result<i64> {
        if !self.open {
            return Err(WizardError::Closed.into());
        }
        if self.step() != WizardStep::Details {
            return Err(WizardError::NotOnLastStep.into());
        }

        self.state = WizardState::Submitting;
        match campaigns.create(self.draft.to_new_campaign()).await {
            Ok(campaign) => {
                self.draft = CampaignDraft::default();
                self.open = false;
                self.state = WizardState::Created(campaign.id);
                Ok(campaign.id)
            }
            Err(e) => {
                tracing::error!("Failed to create campaign: {}", e);
                self.state = WizardState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}
