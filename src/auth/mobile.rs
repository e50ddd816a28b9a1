//! Mobile token gate.
//!
//! Any request carrying a bearer token must present a valid one. Requests without a
//! token are only stopped on the private mobile routes.

use crate::auth::policy::{Decision, RouteTables};
use crate::auth::token::{
    bearer_token, verify_token, InvalidReason, SigningSecret, TokenVerification,
};
use crate::error::AppError;
use axum::http::HeaderMap;

#[derive(Clone)]
pub struct MobileTokenGate {
    secret: SigningSecret,
    routes: RouteTables,
}

impl MobileTokenGate {
    pub fn new(secret: SigningSecret, routes: RouteTables) -> Self {
        MobileTokenGate { secret, routes }
    }

    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> Decision {
        // A header without a second segment counts as no token at all
        let Some(token) = bearer_token(headers) else {
            if self.routes.is_private_mobile(path) {
                tracing::debug!(action = "mobile_auth_missing", path = %path, "No bearer token on private mobile route");
                return Decision::Reject(AppError::Unauthorized);
            }
            return Decision::Allow;
        };

        match verify_token(token, &self.secret) {
            TokenVerification::Valid(claims) => {
                // Diagnostic only; the identifier never affects the decision
                tracing::info!(action = "mobile_auth", path = %path, user_id = ?claims.user_id(), "Bearer token verified");
                Decision::Allow
            }
            TokenVerification::Invalid(reason) => reject_invalid(path, reason),
        }
    }
}

/// Every verification failure gets the same 401; the reason only reaches the log.
pub fn reject_invalid(path: &str, reason: InvalidReason) -> Decision {
    tracing::debug!(action = "mobile_auth_failed", path = %path, reason = %reason, "Bearer token rejected");
    Decision::Reject(AppError::Unauthorized)
}
