//! Route tables and the decision type every guard returns.

use crate::error::AppError;
use axum::response::{IntoResponse, Redirect, Response};

/// Routes that require a valid mobile bearer token. Exact match.
pub const PRIVATE_MOBILE_ROUTES: &[&str] = &["/api/auth/mobile/logout"];

/// Routes restricted to a session backed by a live user. Prefix match.
pub const SINGLE_USER_ROUTES: &[&str] = &["/courses", "/questions", "/bookmarks"];

/// Where invalid sessions are sent.
pub const INVALID_SESSION_PATH: &str = "/invalidsession";

/// Outcome of a guard for one request.
#[derive(Debug)]
pub enum Decision {
    /// Continue to the next handler unmodified.
    Allow,
    /// Stop with an error response.
    Reject(AppError),
    /// Stop with a redirect to the given location.
    Redirect(String),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Response for a terminal decision, `None` for `Allow`.
    pub fn terminal_response(self) -> Option<Response> {
        match self {
            Decision::Allow => None,
            Decision::Reject(err) => Some(err.into_response()),
            Decision::Redirect(location) => Some(Redirect::temporary(&location).into_response()),
        }
    }
}

/// The two fixed route lists, built once at startup and handed to the guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTables {
    pub private_mobile: Vec<String>,
    pub single_user: Vec<String>,
}

impl Default for RouteTables {
    fn default() -> Self {
        RouteTables {
            private_mobile: PRIVATE_MOBILE_ROUTES.iter().map(|r| r.to_string()).collect(),
            single_user: SINGLE_USER_ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl RouteTables {
    pub fn is_private_mobile(&self, path: &str) -> bool {
        self.private_mobile.iter().any(|route| route == path)
    }

    pub fn is_single_user(&self, path: &str) -> bool {
        self.single_user.iter().any(|route| path.starts_with(route.as_str()))
    }
}
