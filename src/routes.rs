//! Application routes and the guard stack around them.

use crate::auth::middleware::{attach_session, mobile_token_gate, session_route_guard, AppState};
use crate::auth::policy::INVALID_SESSION_PATH;
use crate::device::Device;
use axum::{
    http::{header, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Build the routes this service answers itself.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/device", get(device_info))
        .route(INVALID_SESSION_PATH, get(invalid_session))
        .route("/api/auth/mobile/logout", post(mobile_logout))
}

/// Wrap `router` in the guard stack and bind the state.
///
/// Request order: mobile token gate, session cookie, session route guard, handler.
pub fn guard(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(from_fn_with_state(state.clone(), session_route_guard))
        .layer(from_fn_with_state(state.clone(), attach_session))
        .layer(from_fn_with_state(state.clone(), mobile_token_gate))
        .with_state(state)
}

/// GET / — Landing text differs for phones and tablets
async fn index(device: Device) -> impl IntoResponse {
    let body = if device.is_mobile() {
        "Welcome! Get the full experience in the mobile app."
    } else {
        "Welcome! Browse courses, questions and bookmarks."
    };
    ([(header::VARY, "User-Agent")], body)
}

/// GET /api/device — How the client was classified
async fn device_info(device: Device) -> impl IntoResponse {
    Json(json!({
        "device": device.0.as_str(),
        "mobile": device.is_mobile(),
        "desktop": device.is_desktop(),
    }))
}

/// GET /invalidsession — Landing page for rejected sessions
async fn invalid_session() -> impl IntoResponse {
    (
        StatusCode::OK,
        "Your session is no longer valid. Please sign in again.",
    )
}

/// POST /api/auth/mobile/logout — Only reached with a verified bearer token
async fn mobile_logout() -> impl IntoResponse {
    tracing::info!(action = "mobile_logout", "Mobile client logged out");
    StatusCode::NO_CONTENT
}
