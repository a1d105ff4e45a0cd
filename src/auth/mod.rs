//! Authentication: sign-in against the hosted auth service, the cached
//! session, and the route gate that protects dashboard data.

pub mod client;
pub mod gate;
pub mod session;

pub use client::{
    validate_credentials, validate_new_password, AuthClient, NotificationPreferences, Profile,
    SignUpOutcome,
};
pub use gate::{gate, Access, Route};
pub use session::{AuthUser, Session, SessionCache};

use crate::error::{MarketaError, Result};

/// Gate `route` against an optional session
///
/// Returns the session when the route is allowed; a redirect becomes a
/// [`MarketaError::NotAuthenticated`] error naming where the user is sent.
pub fn require_session(route: Route, session: Option<Session>) -> Result<Option<Session>> {
    match gate(route, session.is_some()) {
        Access::Allow => Ok(session),
        Access::Redirect(target) => Err(MarketaError::NotAuthenticated(format!(
            "{} is not available, redirected to {}",
            route, target
        ))
        .into()),
    }
}
