//! Authentication module
//!
//! This module provides the client-side session lifecycle:
//! - Identity and role models
//! - Session persistence in local storage
//! - The injected session context
//! - Login through an ordered chain of providers
//! - Route protection by authentication and role

pub mod models;
pub mod session;
pub mod context;
pub mod providers;
pub mod gateway;
pub mod guard;

pub use models::{Credentials, Identity, Role};
pub use session::SessionStore;
pub use context::SessionContext;
pub use providers::{AuthOutcome, AuthProvider, LocalFallbackProvider, RemoteAuthProvider};
pub use gateway::AuthGateway;
pub use guard::{AccessDenied, GuardState, Protection, RouteGuard};
