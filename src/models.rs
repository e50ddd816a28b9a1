//! Token claims and wire models.
//!
//! All models use serde for serialization/deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Mobile Token Models
// ============================================================================

/// Claims decoded from a verified mobile bearer token.
///
/// Kept as a raw claim object so an unexpected payload shape never fails
/// verification; accessors return `None` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobileClaims(pub Map<String, Value>);

impl MobileClaims {
    /// User identifier claim, `userId` first, then the lowercase `userid` older clients send.
    pub fn user_id(&self) -> Option<&Value> {
        self.0.get("userId").or_else(|| self.0.get("userid"))
    }
}

// ============================================================================
// Session Models
// ============================================================================

/// Session token attached to a request by the session cookie layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Raw token forwarded to the user-lookup endpoint.
    pub jwt_token: String,
}

/// Claims carried by the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Response body of `GET /api/user?token=...`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLookupResponse {
    #[serde(default)]
    pub user: Value,
}

impl UserLookupResponse {
    /// Whether the lookup found a user. Follows JSON truthiness: null, false, 0 and "" are empty.
    pub fn has_user(&self) -> bool {
        match &self.user {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}
