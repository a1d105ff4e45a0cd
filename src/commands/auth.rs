//! Auth command handlers
//!
//! Sessions obtained here are cached in the system keyring so later
//! commands can reach dashboard data without signing in again.

use crate::auth::{
    gate, Access, AuthClient, NotificationPreferences, Profile, Route, Session, SessionCache,
    SignUpOutcome,
};
use crate::cli::AuthCommand;
use crate::commands::{cached_session, prompt_secret};
use crate::config::Config;
use crate::error::{MarketaError, Result};
use colored::Colorize;

/// Dispatch an auth subcommand
pub async fn handle_auth(config: &Config, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::SignIn { email, password } => sign_in(config, &email, password).await,
        AuthCommand::SignUp { email, password } => sign_up(config, &email, password).await,
        AuthCommand::SignOut => sign_out(config).await,
        AuthCommand::Status => {
            status();
            Ok(())
        }
        AuthCommand::ChangePassword => change_password(config).await,
        AuthCommand::Profile {
            full_name,
            company,
            website,
        } => {
            let profile = Profile {
                full_name,
                company,
                website,
            };
            update_profile(config, &profile).await
        }
        AuthCommand::Notifications {
            email_notifications,
            marketing_emails,
            campaign_alerts,
            weekly_reports,
        } => {
            let preferences = NotificationPreferences {
                email_notifications,
                marketing_emails,
                campaign_alerts,
                weekly_reports,
            };
            update_notifications(config, &preferences).await
        }
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt_secret("Password: "),
    }
}

async fn sign_in(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    // Signing in while signed in goes straight to the dashboard.
    if let Access::Redirect(target) = gate(Route::Auth, cached_session().is_some()) {
        println!("Already signed in. Continue at {}.", target.to_string().cyan());
        return Ok(());
    }

    let password = password_or_prompt(password)?;
    let client = AuthClient::new(&config.backend)?;
    let session = client.sign_in(email, &password).await?;

    SessionCache::default().save(&session)?;
    println!(
        "{} {}",
        "Signed in as".green(),
        session
            .user
            .email
            .as_deref()
            .unwrap_or(&session.user.id)
            .bold()
    );
    Ok(())
}

async fn sign_up(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    let client = AuthClient::new(&config.backend)?;

    match client.sign_up(email, &password).await? {
        SignUpOutcome::ConfirmationRequired(_) => {
            println!("{}", "Account created!".green().bold());
            println!("Check your email to confirm your account, then sign in.");
        }
        SignUpOutcome::SignedIn(session) => {
            SessionCache::default().save(&session)?;
            println!("{}", "Account created and signed in.".green().bold());
        }
    }
    Ok(())
}

async fn sign_out(config: &Config) -> Result<()> {
    let cache = SessionCache::default();
    if let Some(session) = cached_session() {
        let client = AuthClient::new(&config.backend)?;
        if let Err(e) = client.sign_out(&session).await {
            // The local session is dropped regardless.
            tracing::warn!("Server-side sign out failed: {}", e);
        }
    }
    cache.clear()?;
    println!("{}", "Signed out.".green());
    Ok(())
}

fn status() {
    let session = cached_session();
    match &session {
        Some(session) => {
            println!(
                "Signed in as {} ({})",
                session.user.email.as_deref().unwrap_or("-").bold(),
                session.user.id
            );
            if let Some(expires_at) = session.expires_at {
                println!("Session expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        None => println!("{}", "Not signed in.".yellow()),
    }

    match gate(Route::Dashboard, session.is_some()) {
        Access::Allow => println!("Dashboard: {}", "available".green()),
        Access::Redirect(target) => {
            println!("Dashboard: {} (redirects to {})", "locked".red(), target)
        }
    }
}

fn signed_in(action: &str) -> Result<Session> {
    cached_session().ok_or_else(|| {
        MarketaError::NotAuthenticated(format!("sign in before {}", action)).into()
    })
}

async fn change_password(config: &Config) -> Result<()> {
    let session = signed_in("changing your password")?;

    let new_password = prompt_secret("New password: ")?;
    let confirm = prompt_secret("Confirm new password: ")?;

    let client = AuthClient::new(&config.backend)?;
    client
        .update_password(&session, &new_password, &confirm)
        .await?;
    println!("{}", "Password updated successfully.".green());
    Ok(())
}

async fn update_profile(config: &Config, profile: &Profile) -> Result<()> {
    let session = signed_in("updating your profile")?;
    let client = AuthClient::new(&config.backend)?;
    client.update_profile(&session, profile).await?;
    println!("{}", "Profile updated successfully".green());
    Ok(())
}

async fn update_notifications(
    config: &Config,
    preferences: &NotificationPreferences,
) -> Result<()> {
    let session = signed_in("changing notification preferences")?;
    let client = AuthClient::new(&config.backend)?;
    client.update_preferences(&session, preferences).await?;
    println!("{}", "Notification preferences updated".green());
    Ok(())
}
