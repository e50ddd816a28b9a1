use crate::auth::policy::RouteTables;
use crate::auth::token::SigningSecret;
use reqwest::Url;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Secret used when `JWT_SECRET` is not set. Startup logs a warning whenever it is in effect.
pub const DEFAULT_JWT_SECRET: &str = "secret";

pub const DEFAULT_SESSION_COOKIE: &str = "next-auth.session-token";

/// What the session guard does when the user-lookup call fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailurePolicy {
    /// Treat the session as invalid and redirect.
    Redirect,
    /// Fail the request with a 500.
    Error,
}

impl std::str::FromStr for LookupFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redirect" => Ok(LookupFailurePolicy::Redirect),
            "error" => Ok(LookupFailurePolicy::Error),
            other => Err(format!("unknown policy '{}' (expected redirect or error)", other)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    // Server
    pub bind_addr: SocketAddr,

    // Mobile bearer tokens
    pub jwt_secret: SigningSecret,

    // Session guard
    pub local_cms_provider: bool,
    pub user_lookup_base_url: Option<Url>,
    pub user_lookup_timeout_secs: u64,
    pub lookup_failure_policy: LookupFailurePolicy,

    // Session cookie
    pub session_cookie_name: String,
    pub session_secret: Option<SigningSecret>,

    // Fixed route lists
    pub routes: RouteTables,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_secret_is_default", &self.jwt_secret.is_default())
            .field("local_cms_provider", &self.local_cms_provider)
            .field("user_lookup_base_url", &self.user_lookup_base_url)
            .field("user_lookup_timeout_secs", &self.user_lookup_timeout_secs)
            .field("lookup_failure_policy", &self.lookup_failure_policy)
            .field("session_cookie_name", &self.session_cookie_name)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("routes", &self.routes)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; production sets variables directly
        let _ = dotenvy::dotenv();

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // Mobile bearer tokens: empty counts as unset
        let jwt_secret = match non_empty_var("JWT_SECRET") {
            Some(secret) => SigningSecret::from_jwk_k(&secret, false),
            None => SigningSecret::from_jwk_k(DEFAULT_JWT_SECRET, true),
        }
        .map_err(|e| ConfigError::InvalidValue("JWT_SECRET".to_string(), e))?;

        // Session guard
        let local_cms_provider = non_empty_var("LOCAL_CMS_PROVIDER").is_some();

        let user_lookup_base_url = match non_empty_var("NEXT_PUBLIC_BASE_URL_LOCAL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidValue("NEXT_PUBLIC_BASE_URL_LOCAL".to_string(), e.to_string())
            })?),
            None => None,
        };

        // The guard is bypassed in local mode, so the lookup service is only required otherwise
        if user_lookup_base_url.is_none() && !local_cms_provider {
            return Err(ConfigError::MissingVar(
                "NEXT_PUBLIC_BASE_URL_LOCAL".to_string(),
            ));
        }

        let user_lookup_timeout_secs = parse_env_or_default("USER_LOOKUP_TIMEOUT_SECS", 5)?;
        if user_lookup_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "USER_LOOKUP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let lookup_failure_policy =
            parse_env_or_default("LOOKUP_FAILURE_POLICY", LookupFailurePolicy::Redirect)?;

        // Session cookie
        let session_cookie_name = non_empty_var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let session_secret = non_empty_var("NEXTAUTH_SECRET").map(SigningSecret::from_raw);

        Ok(Config {
            bind_addr,
            jwt_secret,
            local_cms_provider,
            user_lookup_base_url,
            user_lookup_timeout_secs,
            lookup_failure_policy,
            session_cookie_name,
            session_secret,
            routes: RouteTables::default(),
        })
    }

    pub fn user_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.user_lookup_timeout_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
