//! Request gatekeeping: mobile bearer tokens and single-user session routes.

pub mod middleware;
pub mod mobile;
pub mod policy;
pub mod session;
pub mod token;

pub use middleware::{attach_session, mobile_token_gate, session_route_guard, AppState};
pub use mobile::MobileTokenGate;
pub use policy::{Decision, RouteTables};
pub use session::{SessionRouteGuard, UserLookup};
pub use token::{bearer_token, verify_token, SigningSecret, TokenVerification};
