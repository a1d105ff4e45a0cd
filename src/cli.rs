//! Command-line interface definition for Marketa
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the waitlist, authentication, campaigns and the
//! assistant.

use clap::{ArgAction, Args, Parser, Subcommand};

/// Marketa - AI marketing assistant CLI
///
/// Join the waitlist, manage campaigns and talk to the campaign
/// assistant against the hosted Marketa backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "marketa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Marketa
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Join the launch waitlist
    Waitlist {
        /// Email address to register
        email: String,
    },

    /// Sign in, sign up and manage the cached session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage campaigns
    Campaigns {
        #[command(subcommand)]
        command: CampaignCommand,
    },

    /// Talk to the campaign assistant
    Assistant {
        /// Scope the conversation to a campaign
        #[arg(long)]
        campaign: Option<i64>,

        /// Send a single prompt and exit instead of starting a chat
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Show stored assistant conversations
    History {
        /// Only show conversations for this campaign
        #[arg(long)]
        campaign: Option<i64>,
    },
}

/// Authentication subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Sign in with email and password
    SignIn {
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "MARKETA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    SignUp {
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "MARKETA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the current session
    SignOut,

    /// Show who is signed in
    Status,

    /// Change the signed-in user's password
    ChangePassword,

    /// Update profile details
    Profile {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        website: Option<String>,
    },

    /// Save notification preferences
    Notifications {
        /// Account and security emails
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        email_notifications: bool,

        /// Product news and offers
        #[arg(long, default_value_t = false, action = ArgAction::Set)]
        marketing_emails: bool,

        /// Campaign status alerts
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        campaign_alerts: bool,

        /// Weekly performance reports
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        weekly_reports: bool,
    },
}

/// Campaign subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CampaignCommand {
    /// List your campaigns
    List,

    /// Show one campaign
    Show {
        id: i64,
    },

    /// Create a campaign (interactive unless --name is given)
    New(NewCampaignArgs),

    /// Change a campaign's status
    SetStatus {
        id: i64,

        /// draft, active or paused
        status: String,
    },

    /// Delete a campaign
    Delete {
        id: i64,
    },
}

/// Fields for non-interactive campaign creation
#[derive(Args, Debug, Clone, Default)]
pub struct NewCampaignArgs {
    /// Campaign name; omit to use the interactive wizard
    #[arg(long)]
    pub name: Option<String>,

    /// awareness, traffic, leads, sales, retention or custom
    #[arg(long)]
    pub objective: Option<String>,

    /// draft, active or paused
    #[arg(long)]
    pub status: Option<String>,

    /// Channel to run on; repeat for several
    #[arg(long = "channel")]
    pub channels: Vec<String>,

    /// Total budget
    #[arg(long)]
    pub budget: Option<String>,

    /// Strategy notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_waitlist() {
        let cli = Cli::try_parse_from(["marketa", "waitlist", "a@b.c"]).unwrap();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        if let Commands::Waitlist { email } = cli.command {
            assert_eq!(email, "a@b.c");
        } else {
            panic!("Expected Waitlist command");
        }
    }

    #[test]
    fn test_cli_parse_sign_in() {
        let cli = Cli::try_parse_from([
            "marketa", "auth", "sign-in", "--email", "a@b.c", "--password", "pw",
        ])
        .unwrap();
        match cli.command {
            Commands::Auth {
                command: AuthCommand::SignIn { email, password },
            } => {
                assert_eq!(email, "a@b.c");
                assert_eq!(password, Some("pw".to_string()));
            }
            other => panic!("Expected sign-in, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_campaign_new_flags() {
        let cli = Cli::try_parse_from([
            "marketa",
            "campaigns",
            "new",
            "--name",
            "Q4 Push",
            "--channel",
            "email",
            "--channel",
            "google",
            "--budget",
            "5000",
        ])
        .unwrap();
        match cli.command {
            Commands::Campaigns {
                command: CampaignCommand::New(args),
            } => {
                assert_eq!(args.name.as_deref(), Some("Q4 Push"));
                assert_eq!(args.channels, vec!["email", "google"]);
                assert_eq!(args.budget.as_deref(), Some("5000"));
                assert!(args.objective.is_none());
            }
            other => panic!("Expected campaigns new, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_assistant_with_campaign() {
        let cli = Cli::try_parse_from([
            "marketa",
            "-v",
            "assistant",
            "--campaign",
            "3",
            "--prompt",
            "hi",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Assistant { campaign, prompt } => {
                assert_eq!(campaign, Some(3));
                assert_eq!(prompt.as_deref(), Some("hi"));
            }
            other => panic!("Expected assistant, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_notifications_defaults_and_overrides() {
        let cli = Cli::try_parse_from([
            "marketa",
            "auth",
            "notifications",
            "--marketing-emails",
            "true",
            "--weekly-reports",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Auth {
                command:
                    AuthCommand::Notifications {
                        email_notifications,
                        marketing_emails,
                        campaign_alerts,
                        weekly_reports,
                    },
            } => {
                assert!(email_notifications);
                assert!(marketing_emails);
                assert!(campaign_alerts);
                assert!(!weekly_reports);
            }
            other => panic!("Expected notifications, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_non_numeric_campaign_id() {
        assert!(Cli::try_parse_from(["marketa", "campaigns", "show", "abc"]).is_err());
    }
}
