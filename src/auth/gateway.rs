//! Login and logout

use crate::api::ApiClient;
use crate::auth::context::SessionContext;
use crate::auth::models::{Credentials, Identity};
use crate::auth::providers::{AuthOutcome, AuthProvider, LocalFallbackProvider, RemoteAuthProvider};
use crate::core::busy::BusyFlag;
use crate::core::config::BuildMode;
use crate::core::error::{DashboardError, Result};
use std::sync::Arc;

pub struct AuthGateway {
    providers: Vec<Box<dyn AuthProvider>>,
    session: Arc<SessionContext>,
    in_flight: BusyFlag,
}

impl AuthGateway {
    /// Remote login first; the local development accounts are appended only
    /// when the effective build mode is development.
    pub fn new(api: ApiClient, session: Arc<SessionContext>, mode: BuildMode) -> Self {
        let mut providers: Vec<Box<dyn AuthProvider>> = vec![Box::new(RemoteAuthProvider::new(api))];
        if !mode.effective().is_production() {
            providers.push(Box::new(LocalFallbackProvider::new()));
        }
        Self::with_providers(providers, session)
    }

    pub fn with_providers(providers: Vec<Box<dyn AuthProvider>>, session: Arc<SessionContext>) -> Self {
        Self {
            providers,
            session,
            in_flight: BusyFlag::new(),
        }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// True while a login call is running
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Authenticate, persist the identity and make it the current session.
    ///
    /// `remember` stores the username for the next login form; passing
    /// `false` forgets any previously remembered one.
    pub async fn login(&self, username: &str, password: &str, remember: bool) -> Result<Identity> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(DashboardError::Validation(
                "Please enter both username and password".to_string(),
            ));
        }

        let _busy = self.in_flight.acquire("Login")?;
        let credentials = Credentials::new(username.trim(), password);
        tracing::info!(username = %credentials.username, "Login attempt");

        let mut unavailable = Vec::new();
        for provider in &self.providers {
            match provider.authenticate(&credentials).await? {
                AuthOutcome::Authenticated(identity) => {
                    self.session.establish(identity.clone())?;
                    let remembered = remember.then_some(credentials.username.as_str());
                    if let Err(e) = self.session.store().remember_username(remembered) {
                        tracing::warn!(error = %e, "Could not update remembered username");
                    }
                    tracing::info!(
                        provider = provider.name(),
                        user_id = %identity.id,
                        role = %identity.role,
                        "Login successful"
                    );
                    return Ok(identity);
                }
                AuthOutcome::Rejected(message) => {
                    tracing::warn!(provider = provider.name(), username = %credentials.username, "Login rejected");
                    return Err(DashboardError::Authentication(message));
                }
                AuthOutcome::Unavailable(reason) => {
                    tracing::debug!(provider = provider.name(), %reason, "Provider unavailable, trying next");
                    unavailable.push(format!("{}: {}", provider.name(), reason));
                }
            }
        }

        Err(DashboardError::Connectivity(if unavailable.is_empty() {
            "no authentication provider configured".to_string()
        } else {
            unavailable.join("; ")
        }))
    }

    /// End the session. Purely local; no request is made.
    pub fn logout(&self) -> Result<()> {
        if let Some(identity) = self.session.current() {
            tracing::info!(user_id = %identity.id, "Logout");
        }
        self.session.end()
    }
}
