//! UI layer: axum router, connection hub and HTTP endpoints.

pub mod handler;
pub mod rate_limit;
mod server;
mod signal;
pub mod state;

pub use rate_limit::RateLimitConfig;
pub use server::Server;
pub use signal::shutdown_signal;
pub use state::{AppState, HubConfig};
