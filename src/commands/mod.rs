/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `waitlist` : Join the launch waitlist
- `auth`     : Sign in/up/out, session status and password change
- `campaigns`: Campaign listing, inspection and the creation wizard
- `assistant`: Interactive or single-prompt assistant turns
- `history`  : Stored assistant conversations

Handlers that touch dashboard data pass through the route gate first and
fail with a not-signed-in error when it redirects.
*/

use crate::auth::{require_session, Route, Session, SessionCache};
use crate::config::Config;
use crate::error::{MarketaError, Result};
use crate::store::RestStore;
use rustyline::DefaultEditor;
use std::sync::Arc;

pub mod assistant;
pub mod auth;
pub mod campaigns;
pub mod history;
pub mod special_commands;
pub mod waitlist;

/// Load the cached session, treating an unavailable keyring as signed out
pub fn cached_session() -> Option<Session> {
    match SessionCache::default().load() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Could not read cached session: {}", e);
            None
        }
    }
}

/// Gate `route` and open the store as the signed-in user
///
/// # Errors
///
/// Returns [`MarketaError::NotAuthenticated`] when no valid session is
/// cached.
pub fn open_dashboard(config: &Config, route: Route) -> Result<(Session, Arc<RestStore>)> {
    let session = require_session(route, cached_session())?.ok_or_else(|| {
        MarketaError::NotAuthenticated(format!("{} requires a session", route))
    })?;

    let store = Arc::new(RestStore::new(&config.backend)?);
    store.set_access_token(Some(session.access_token.clone()));
    Ok((session, store))
}

/// Read one line, returning `None` on an empty answer
pub fn prompt_line(rl: &mut DefaultEditor, label: &str) -> Result<Option<String>> {
    let line = rl
        .readline(label)
        .map_err(|e| MarketaError::Validation(format!("Input aborted: {}", e)))?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Read a secret; the line is not added to the editor history
pub fn prompt_secret(label: &str) -> Result<String> {
    let mut rl = DefaultEditor::new()?;
    let line = rl
        .readline(label)
        .map_err(|e| MarketaError::Validation(format!("Input aborted: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_dashboard_without_session_is_rejected() {
        // No keyring entry exists for a fresh test user, and an
        // unavailable keyring is treated the same way.
        if cached_session().is_some() {
            return;
        }
        let err = open_dashboard(&Config::default(), Route::Campaigns).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MarketaError>(),
            Some(MarketaError::NotAuthenticated(_))
        ));
    }
}
