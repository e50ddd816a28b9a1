//! Axum middleware wiring the guards into the request pipeline.

use crate::auth::mobile::MobileTokenGate;
use crate::auth::policy::Decision;
use crate::auth::session::{decode_session_cookie, LookupError, SessionRouteGuard, UserLookup};
use crate::config::Config;
use crate::models::SessionToken;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Application state shared across middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mobile_gate: MobileTokenGate,
    pub session_guard: SessionRouteGuard,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, LookupError> {
        let lookup = UserLookup::new(
            config.user_lookup_base_url.clone(),
            config.user_lookup_timeout(),
        )?;

        Ok(AppState {
            mobile_gate: MobileTokenGate::new(config.jwt_secret.clone(), config.routes.clone()),
            session_guard: SessionRouteGuard::new(
                config.local_cms_provider,
                config.routes.clone(),
                lookup,
                config.lookup_failure_policy,
            ),
            config: Arc::new(config),
        })
    }
}

async fn dispatch(decision: Decision, request: Request, next: Next) -> Response {
    match decision.terminal_response() {
        Some(response) => response,
        None => next.run(request).await,
    }
}

/// Verify mobile bearer tokens.
pub async fn mobile_token_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let decision = state
        .mobile_gate
        .evaluate(request.uri().path(), request.headers());
    dispatch(decision, request, next).await
}

/// Attach the `SessionToken` from a verified session cookie to the request extensions.
///
/// Does nothing when no session secret is configured.
pub async fn attach_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(secret) = &state.config.session_secret {
        if let Some(session) =
            decode_session_cookie(request.headers(), &state.config.session_cookie_name, secret)
        {
            request.extensions_mut().insert(session);
        }
    }
    next.run(request).await
}

/// Restrict single-user routes to sessions backed by a live user.
pub async fn session_route_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Owned copies: the request body is not Sync, so no borrow of it may cross the await
    let path = request.uri().path().to_string();
    let session = request.extensions().get::<SessionToken>().cloned();

    let decision = state
        .session_guard
        .evaluate(&path, session.as_ref())
        .await;
    dispatch(decision, request, next).await
}
