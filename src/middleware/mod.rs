/// Middleware module
///
/// Token gate for protected routes and CORS handling.

mod auth_gate;
mod cors;

pub use auth_gate::{extract_token, AuthGate};
pub use cors::cors_policy;
