//! Single-user session guard and the user-lookup client behind it.

use crate::auth::policy::{Decision, RouteTables, INVALID_SESSION_PATH};
use crate::auth::token::{hs256_validation, SigningSecret};
use crate::config::LookupFailurePolicy;
use crate::error::AppError;
use crate::models::{SessionClaims, SessionToken, UserLookupResponse};
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use reqwest::Url;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("user lookup base URL is not configured")]
    NotConfigured,

    #[error("user lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Client for `GET {base}/api/user?token=...`.
#[derive(Clone)]
pub struct UserLookup {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl UserLookup {
    /// Every call is bounded by `timeout`.
    pub fn new(base_url: Option<Url>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(UserLookup { client, base_url })
    }

    /// Ask the user endpoint whether `token` belongs to a live user.
    pub async fn has_user(&self, token: &str) -> Result<bool, LookupError> {
        let base = self.base_url.as_ref().ok_or(LookupError::NotConfigured)?;
        let url = format!("{}/api/user", base.as_str().trim_end_matches('/'));

        let body: UserLookupResponse = self
            .client
            .get(url)
            .query(&[("token", token)])
            .send()
            .await?
            .json()
            .await?;

        Ok(body.has_user())
    }
}

/// Redirects requests for single-user routes unless their session maps to a live user.
#[derive(Clone)]
pub struct SessionRouteGuard {
    local_cms_provider: bool,
    routes: RouteTables,
    lookup: UserLookup,
    failure_policy: LookupFailurePolicy,
}

impl SessionRouteGuard {
    pub fn new(
        local_cms_provider: bool,
        routes: RouteTables,
        lookup: UserLookup,
        failure_policy: LookupFailurePolicy,
    ) -> Self {
        SessionRouteGuard {
            local_cms_provider,
            routes,
            lookup,
            failure_policy,
        }
    }

    pub async fn evaluate(&self, path: &str, session: Option<&SessionToken>) -> Decision {
        if self.local_cms_provider || !self.routes.is_single_user(path) {
            return Decision::Allow;
        }

        let Some(session) = session else {
            tracing::debug!(action = "session_missing", path = %path, "No session on single-user route");
            return invalid_session();
        };

        match self.lookup.has_user(&session.jwt_token).await {
            Ok(true) => Decision::Allow,
            Ok(false) => {
                tracing::info!(action = "session_rejected", path = %path, "Session has no user");
                invalid_session()
            }
            Err(e) => self.on_lookup_failure(path, e),
        }
    }

    fn on_lookup_failure(&self, path: &str, err: LookupError) -> Decision {
        match self.failure_policy {
            LookupFailurePolicy::Redirect => {
                tracing::warn!(action = "session_lookup_failed", path = %path, error = %err, "User lookup failed, treating session as invalid");
                invalid_session()
            }
            LookupFailurePolicy::Error => {
                Decision::Reject(AppError::Internal(format!("User lookup failed: {}", err)))
            }
        }
    }
}

fn invalid_session() -> Decision {
    Decision::Redirect(INVALID_SESSION_PATH.to_string())
}

/// Read the session cookie and return its token when the cookie verifies.
pub fn decode_session_cookie(
    headers: &HeaderMap,
    cookie_name: &str,
    secret: &SigningSecret,
) -> Option<SessionToken> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(cookie_name)?;

    match jsonwebtoken::decode::<SessionClaims>(
        cookie.value(),
        &secret.decoding_key(),
        &hs256_validation(),
    ) {
        Ok(data) => Some(SessionToken {
            jwt_token: data.claims.jwt_token,
        }),
        Err(e) => {
            tracing::debug!(action = "session_cookie_invalid", error = %e, "Ignoring session cookie");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use axum::response::{Html, IntoResponse, Response};
    use axum::{extract::Query, routing::get, Json, Router};
    use jsonwebtoken::{encode, Algorithm, Header};
    use serde_json::json;
    use std::collections::HashMap;

    /// Serve `/api/user`: token "alice" has a user, "slow" never answers in time,
    /// "html" gets an HTML error page, anything else has none.
    async fn spawn_lookup_server() -> Url {
        async fn user(Query(params): Query<HashMap<String, String>>) -> Response {
            match params.get("token").map(String::as_str) {
                Some("alice") => Json(json!({ "user": { "id": "u-1" } })).into_response(),
                Some("slow") => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({ "user": { "id": "u-2" } })).into_response()
                }
                Some("html") => Html("<html><body>502 Bad Gateway</body></html>").into_response(),
                _ => Json(json!({ "user": null })).into_response(),
            }
        }

        let app = Router::new().route("/api/user", get(user));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn guard(
        base_url: Option<Url>,
        policy: LookupFailurePolicy,
        local: bool,
    ) -> SessionRouteGuard {
        let lookup = UserLookup::new(base_url, Duration::from_millis(300)).unwrap();
        SessionRouteGuard::new(local, RouteTables::default(), lookup, policy)
    }

    fn session(token: &str) -> SessionToken {
        SessionToken {
            jwt_token: token.to_string(),
        }
    }

    fn is_invalid_session(decision: &Decision) -> bool {
        matches!(decision, Decision::Redirect(location) if location == INVALID_SESSION_PATH)
    }

    #[tokio::test]
    async fn test_missing_session_redirects() {
        let guard = guard(None, LookupFailurePolicy::Redirect, false);
        for path in ["/courses", "/questions/3", "/bookmarks"] {
            assert!(is_invalid_session(&guard.evaluate(path, None).await));
        }
    }

    #[tokio::test]
    async fn test_unguarded_path_skips_check() {
        let guard = guard(None, LookupFailurePolicy::Error, false);
        assert!(guard.evaluate("/about", None).await.is_allow());
    }

    #[tokio::test]
    async fn test_local_mode_bypasses() {
        let guard = guard(None, LookupFailurePolicy::Error, true);
        assert!(guard.evaluate("/courses", None).await.is_allow());
        assert!(guard.evaluate("/bookmarks/1", Some(&session("x"))).await.is_allow());
    }

    #[tokio::test]
    async fn test_live_user_allows() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Redirect, false);
        assert!(guard.evaluate("/courses/1", Some(&session("alice"))).await.is_allow());
    }

    #[tokio::test]
    async fn test_unknown_user_redirects() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Redirect, false);
        let decision = guard.evaluate("/courses/1", Some(&session("mallory"))).await;
        assert!(is_invalid_session(&decision));
    }

    #[tokio::test]
    async fn test_timeout_follows_redirect_policy() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Redirect, false);
        let decision = guard.evaluate("/questions", Some(&session("slow"))).await;
        assert!(is_invalid_session(&decision));
    }

    #[tokio::test]
    async fn test_timeout_follows_error_policy() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Error, false);
        let decision = guard.evaluate("/questions", Some(&session("slow"))).await;
        assert!(matches!(decision, Decision::Reject(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_html_body_is_a_lookup_failure() {
        let base = spawn_lookup_server().await;
        let lookup = UserLookup::new(Some(base), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            lookup.has_user("html").await,
            Err(LookupError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_html_body_follows_redirect_policy() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Redirect, false);
        let decision = guard.evaluate("/bookmarks", Some(&session("html"))).await;
        assert!(is_invalid_session(&decision));
    }

    #[tokio::test]
    async fn test_html_body_follows_error_policy() {
        let base = spawn_lookup_server().await;
        let guard = guard(Some(base), LookupFailurePolicy::Error, false);
        let decision = guard.evaluate("/bookmarks", Some(&session("html"))).await;
        assert!(matches!(decision, Decision::Reject(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_lookup_is_a_failure() {
        let lookup = UserLookup::new(None, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            lookup.has_user("alice").await,
            Err(LookupError::NotConfigured)
        ));
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn session_cookie(secret: &SigningSecret, jwt_token: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({ "jwtToken": jwt_token, "name": "Alice" }),
            &secret.encoding_key(),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_session_cookie() {
        let secret = SigningSecret::from_raw("cookie-secret".to_string());
        let cookie = session_cookie(&secret, "alice");
        let headers = cookie_headers(&format!("theme=dark; next-auth.session-token={}", cookie));

        let token = decode_session_cookie(&headers, "next-auth.session-token", &secret);
        assert_eq!(token, Some(session("alice")));
    }

    #[test]
    fn test_decode_session_cookie_wrong_secret() {
        let secret = SigningSecret::from_raw("cookie-secret".to_string());
        let other = SigningSecret::from_raw("other-secret".to_string());
        let cookie = session_cookie(&other, "alice");
        let headers = cookie_headers(&format!("next-auth.session-token={}", cookie));

        assert!(decode_session_cookie(&headers, "next-auth.session-token", &secret).is_none());
    }

    #[test]
    fn test_decode_session_cookie_absent() {
        let secret = SigningSecret::from_raw("cookie-secret".to_string());
        let headers = cookie_headers("theme=dark");
        assert!(decode_session_cookie(&headers, "next-auth.session-token", &secret).is_none());
        assert!(
            decode_session_cookie(&HeaderMap::new(), "next-auth.session-token", &secret).is_none()
        );
    }
}
