//! Bearer token extraction and HS256 JWT verification.

use crate::models::MobileClaims;
use axum::http::{header, HeaderMap};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use jsonwebtoken::{
    decode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey, EncodingKey,
    Validation,
};

/// Decoder for the `k` member of an `oct` JWK: base64url, padding optional, trailing bits ignored.
const JWK_K: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Symmetric HMAC key material.
#[derive(Clone)]
pub struct SigningSecret {
    bytes: Vec<u8>,
    is_default: bool,
}

impl SigningSecret {
    /// Build a key from a JWK `k` value (base64url text).
    pub fn from_jwk_k(k: &str, is_default: bool) -> Result<Self, String> {
        let bytes = JWK_K
            .decode(k.trim())
            .map_err(|e| format!("invalid base64url key: {}", e))?;
        if bytes.is_empty() {
            return Err("key is empty".to_string());
        }
        Ok(SigningSecret { bytes, is_default })
    }

    /// Build a key from raw secret text, used as-is.
    pub fn from_raw(secret: String) -> Self {
        SigningSecret {
            bytes: secret.into_bytes(),
            is_default: false,
        }
    }

    /// True when the key came from the built-in fallback rather than operator configuration.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }
}

/// Why a token failed verification. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Malformed,
    BadSignature,
    Expired,
    NotYetValid,
    Other(String),
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Malformed => f.write_str("malformed token"),
            InvalidReason::BadSignature => f.write_str("bad signature"),
            InvalidReason::Expired => f.write_str("expired"),
            InvalidReason::NotYetValid => f.write_str("not yet valid"),
            InvalidReason::Other(msg) => f.write_str(msg),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for InvalidReason {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => InvalidReason::Malformed,
            ErrorKind::InvalidSignature => InvalidReason::BadSignature,
            ErrorKind::ExpiredSignature => InvalidReason::Expired,
            ErrorKind::ImmatureSignature => InvalidReason::NotYetValid,
            _ => InvalidReason::Other(err.to_string()),
        }
    }
}

/// Result of verifying a bearer token.
#[derive(Debug)]
pub enum TokenVerification {
    Valid(MobileClaims),
    Invalid(InvalidReason),
}

/// Extract the token from `Authorization: <scheme> <token>`.
///
/// Takes the segment after the first space; a header without one yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

/// HS256 with no leeway. `exp` and `nbf` are checked only when present, audience is ignored.
pub(crate) fn hs256_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Verify a mobile bearer token.
pub fn verify_token(token: &str, secret: &SigningSecret) -> TokenVerification {
    let claims = match decode::<MobileClaims>(token, &secret.decoding_key(), &hs256_validation()) {
        Ok(data) => data.claims,
        Err(err) => return TokenVerification::Invalid(InvalidReason::from(err)),
    };

    match check_time_claims(&claims, get_current_timestamp()) {
        Ok(()) => TokenVerification::Valid(claims),
        Err(reason) => TokenVerification::Invalid(reason),
    }
}

/// Check `exp` and `nbf` on the raw claim values.
///
/// jsonwebtoken skips these claims when they do not parse as `u64`, so string,
/// negative and fractional values are handled here. A present claim must be a
/// JSON number; `exp <= now` is expired and `nbf > now` is not yet valid.
fn check_time_claims(claims: &MobileClaims, now: u64) -> Result<(), InvalidReason> {
    let now = now as f64;

    if let Some(exp) = claims.0.get("exp") {
        let exp = exp.as_f64().ok_or(InvalidReason::Malformed)?;
        if exp <= now {
            return Err(InvalidReason::Expired);
        }
    }

    if let Some(nbf) = claims.0.get("nbf") {
        let nbf = nbf.as_f64().ok_or(InvalidReason::Malformed)?;
        if nbf > now {
            return Err(InvalidReason::NotYetValid);
        }
    }

    Ok(())
}
