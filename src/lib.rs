//! Stroke Dashboard Client Library
//!
//! This library provides the client side of the stroke-risk clinical
//! dashboard, including session handling, role-based route protection,
//! the diagnosis upload flow and a typed client for the remote REST API.

pub mod api;
pub mod auth;
pub mod core;
pub mod dashboard;
pub mod diagnosis;
pub mod routes;

// Re-export commonly used types
pub use api::ApiClient;
pub use auth::{AuthGateway, Identity, Role, RouteGuard, SessionContext, SessionStore};
pub use crate::core::{Config, DashboardError, Notification};
pub use dashboard::DashboardView;
pub use diagnosis::DiagnosisFlow;
pub use routes::{Navigation, Navigator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;
