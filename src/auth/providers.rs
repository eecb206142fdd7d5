//! Authentication providers
//!
//! Login walks an ordered chain of providers. Each one either authenticates
//! the user, rejects the credentials outright, or reports that it could not
//! make the attempt so the next provider gets a turn.

use crate::api::ApiClient;
use crate::auth::models::{Credentials, Identity, Role};
use crate::core::error::{DashboardError, Result};
use async_trait::async_trait;

/// Message used when a provider rejects credentials without saying why
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    /// Definitive rejection; stops the chain
    Rejected(String),
    /// The provider could not attempt authentication; try the next one
    Unavailable(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Errors stop the chain without consulting later providers
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthOutcome>;
}

/// Authenticates against the remote API
pub struct RemoteAuthProvider {
    api: ApiClient,
}

impl RemoteAuthProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthProvider for RemoteAuthProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthOutcome> {
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(DashboardError::Connectivity(reason)) => return Ok(AuthOutcome::Unavailable(reason)),
            Err(e) => return Err(e),
        };

        match (response.success, response.data) {
            (true, Some(identity)) => Ok(AuthOutcome::Authenticated(identity)),
            (true, None) => Err(DashboardError::server_unexplained(
                "Login response did not include a user",
            )),
            (false, _) => Ok(AuthOutcome::Rejected(
                response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
            )),
        }
    }
}

struct LocalAccount {
    id: &'static str,
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
}

/// Fixed development accounts, consulted only when the API is unreachable
pub struct LocalFallbackProvider {
    accounts: Vec<LocalAccount>,
}

impl LocalFallbackProvider {
    pub fn new() -> Self {
        Self {
            accounts: vec![
                LocalAccount {
                    id: "local-admin",
                    username: "admin",
                    password: "admin123",
                    full_name: "Administrator",
                    role: Role::Admin,
                },
                LocalAccount {
                    id: "local-doctor",
                    username: "doctor",
                    password: "doctor123",
                    full_name: "Doctor",
                    role: Role::Doctor,
                },
            ],
        }
    }
}

impl Default for LocalFallbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for LocalFallbackProvider {
    fn name(&self) -> &'static str {
        "local-fallback"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthOutcome> {
        let account = self
            .accounts
            .iter()
            .find(|a| a.username == credentials.username && a.password == credentials.password);

        Ok(match account {
            Some(account) => {
                tracing::warn!(username = %account.username, "Signed in with local development account");
                AuthOutcome::Authenticated(Identity {
                    id: account.id.to_string(),
                    username: account.username.to_string(),
                    full_name: account.full_name.to_string(),
                    role: account.role.clone(),
                })
            }
            None => AuthOutcome::Rejected(INVALID_CREDENTIALS.to_string()),
        })
    }
}
