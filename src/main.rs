//! Marketa - AI marketing assistant CLI
//!
#![doc = "Marketa - AI marketing assistant CLI"]
#![doc = "Main entry point for the Marketa command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketa::cli::{Cli, Commands};
use marketa::commands;
use marketa::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Waitlist { email } => {
            tracing::info!("Starting waitlist signup");
            commands::waitlist::handle_waitlist(&config, &email).await?;
            Ok(())
        }
        Commands::Auth { command } => {
            tracing::info!("Starting auth command");
            commands::auth::handle_auth(&config, command).await?;
            Ok(())
        }
        Commands::Campaigns { command } => {
            tracing::info!("Starting campaigns command");
            commands::campaigns::handle_campaigns(&config, command).await?;
            Ok(())
        }
        Commands::Assistant { campaign, prompt } => {
            if let Some(id) = campaign {
                tracing::debug!("Scoping assistant to campaign {}", id);
            }
            commands::assistant::run_assistant(&config, campaign, prompt).await?;
            Ok(())
        }
        Commands::History { campaign } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, campaign).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "marketa=debug" } else { "marketa=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
