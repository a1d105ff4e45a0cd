//! Route gate
//!
//! Decides whether a location may be shown given whether a session is
//! present. Dashboard locations require a session; the public entry
//! points bounce a signed-in user to the dashboard.

use std::fmt;

/// A navigable location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Auth,
    Signup,
    AuthCallback,
    Dashboard,
    Campaigns,
    CampaignDetail(i64),
    Assistant,
    Settings,
    NotFound,
}

impl Route {
    /// Parse a path into a route
    ///
    /// Trailing slashes and query strings are ignored. Anything that does
    /// not match a known location is [`Route::NotFound`].
    ///
    /// # Examples
    ///
    /// ```
    /// use marketa::auth::Route;
    ///
    /// assert_eq!(Route::parse("/dashboard/"), Route::Dashboard);
    /// assert_eq!(Route::parse("/dashboard/campaigns/7"), Route::CampaignDetail(7));
    /// assert_eq!(Route::parse("/nope"), Route::NotFound);
    /// ```
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Landing,
            ["auth"] => Route::Auth,
            ["signup"] => Route::Signup,
            ["auth", "callback"] => Route::AuthCallback,
            ["dashboard"] => Route::Dashboard,
            ["dashboard", "campaigns"] => Route::Campaigns,
            ["dashboard", "campaigns", id] => match id.parse() {
                Ok(id) => Route::CampaignDetail(id),
                Err(_) => Route::NotFound,
            },
            ["dashboard", "assistant"] => Route::Assistant,
            ["dashboard", "settings"] => Route::Settings,
            _ => Route::NotFound,
        }
    }

    /// Canonical path for the route
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Auth => "/auth".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::AuthCallback => "/auth/callback".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Campaigns => "/dashboard/campaigns".to_string(),
            Route::CampaignDetail(id) => format!("/dashboard/campaigns/{}", id),
            Route::Assistant => "/dashboard/assistant".to_string(),
            Route::Settings => "/dashboard/settings".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Returns `true` for locations that need a session
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::Campaigns
                | Route::CampaignDetail(_)
                | Route::Assistant
                | Route::Settings
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Outcome of gating a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

/// Decide whether `route` may be shown
///
/// # Examples
///
/// ```
/// use marketa::auth::{gate, Access, Route};
///
/// assert_eq!(gate(Route::Assistant, false), Access::Redirect(Route::Auth));
/// assert_eq!(gate(Route::Auth, true), Access::Redirect(Route::Dashboard));
/// assert_eq!(gate(Route::Assistant, true), Access::Allow);
/// ```
pub fn gate(route: Route, session_present: bool) -> Access {
    match route {
        Route::AuthCallback if session_present => Access::Redirect(Route::Dashboard),
        Route::AuthCallback => Access::Redirect(Route::Auth),
        Route::Landing | Route::Auth | Route::Signup if session_present => {
            Access::Redirect(Route::Dashboard)
        }
        r if r.requires_session() && !session_present => Access::Redirect(Route::Auth),
        _ => Access::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHBOARD_ROUTES: [Route; 5] = [
        Route::Dashboard,
        Route::Campaigns,
        Route::CampaignDetail(3),
        Route::Assistant,
        Route::Settings,
    ];

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse("/"), Route::Landing);
        assert_eq!(Route::parse(""), Route::Landing);
        assert_eq!(Route::parse("/auth"), Route::Auth);
        assert_eq!(Route::parse("/signup"), Route::Signup);
        assert_eq!(Route::parse("/auth/callback?code=x"), Route::AuthCallback);
        assert_eq!(Route::parse("/dashboard/assistant"), Route::Assistant);
        assert_eq!(Route::parse("/dashboard/settings#top"), Route::Settings);
        assert_eq!(Route::parse("/dashboard/campaigns/x"), Route::NotFound);
    }

    #[test]
    fn test_path_parses_back() {
        for route in DASHBOARD_ROUTES {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_dashboard_requires_session() {
        for route in DASHBOARD_ROUTES {
            assert_eq!(gate(route, false), Access::Redirect(Route::Auth));
            assert_eq!(gate(route, true), Access::Allow);
        }
    }

    #[test]
    fn test_public_entry_points_redirect_signed_in_user() {
        for route in [Route::Landing, Route::Auth, Route::Signup] {
            assert_eq!(gate(route, true), Access::Redirect(Route::Dashboard));
            assert_eq!(gate(route, false), Access::Allow);
        }
    }

    #[test]
    fn test_auth_callback_always_redirects() {
        assert_eq!(
            gate(Route::AuthCallback, true),
            Access::Redirect(Route::Dashboard)
        );
        assert_eq!(gate(Route::AuthCallback, false), Access::Redirect(Route::Auth));
    }

    #[test]
    fn test_not_found_is_public() {
        assert_eq!(gate(Route::NotFound, false), Access::Allow);
        assert_eq!(gate(Route::NotFound, true), Access::Allow);
    }
}
