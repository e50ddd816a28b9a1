//! Gatehouse entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Build the guard state (token gate, session guard, user-lookup client)
//! 3. Build router with app routes + static file serving
//! 4. Wrap everything in the guard stack
//! 5. Start Axum server

use gatehouse::{auth::middleware::AppState, config::Config, routes};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting gatehouse on {}", config.bind_addr);

    if config.jwt_secret.is_default() {
        tracing::warn!(
            action = "default_jwt_secret",
            "JWT_SECRET is not set; mobile tokens are verified with the built-in default secret. Set JWT_SECRET before exposing this service."
        );
    }
    if config.local_cms_provider {
        tracing::warn!(
            action = "local_cms_provider",
            "LOCAL_CMS_PROVIDER is set; single-user routes are not checked"
        );
    }

    let bind_addr = config.bind_addr;
    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to build user lookup client: {}", e);
            std::process::exit(1);
        }
    };

    // Single-origin deployment: no cross-origin requests allowed
    let app = routes::guard(
        routes::app_router().fallback_service(ServeDir::new("static")),
        state,
    )
    .layer(CorsLayer::new());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
