//! Dashboard routes and navigation

use crate::auth::context::SessionContext;
use crate::auth::guard::{AccessDenied, GuardState, RouteGuard, LANDING_PATH, LOGIN_PATH};
use crate::auth::models::Role;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub title: &'static str,
    /// `None` for public pages
    pub guard: Option<RouteGuard>,
}

impl Route {
    fn matches(&self, path: &str) -> bool {
        path == self.path
            || path
                .strip_prefix(self.path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Build the dashboard route table
pub fn build_routes() -> Vec<Route> {
    vec![
        // Public routes
        Route { path: LOGIN_PATH, title: "Sign in", guard: None },
        // Any signed-in user
        Route { path: LANDING_PATH, title: "Dashboard", guard: Some(RouteGuard::authenticated()) },
        Route { path: "/patients", title: "Patients", guard: Some(RouteGuard::authenticated()) },
        Route { path: "/consultations", title: "Consultations", guard: Some(RouteGuard::authenticated()) },
        Route { path: "/diagnosis", title: "New diagnosis", guard: Some(RouteGuard::authenticated()) },
        Route { path: "/statistics", title: "Statistics", guard: Some(RouteGuard::authenticated()) },
        // Admin only
        Route { path: "/users", title: "Users", guard: Some(RouteGuard::roles([Role::Admin])) },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session restoration still pending; show a spinner, do not move
    Loading,
    Render { path: String, title: &'static str },
    Redirect { to: String, from: Option<String> },
    AccessDenied(AccessDenied),
    NotFound { path: String },
}

/// Tracks the current location and the page to return to after login
pub struct Navigator {
    routes: Vec<Route>,
    session: Arc<SessionContext>,
    location: String,
    return_to: Option<String>,
}

impl Navigator {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            routes: build_routes(),
            session,
            location: LOGIN_PATH.to_string(),
            return_to: None,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Page a completed login will return to
    pub fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref()
    }

    pub fn route_for(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }

    pub fn navigate(&mut self, path: &str) -> Navigation {
        let route = match self.route_for(path) {
            Some(route) => route.clone(),
            None => return Navigation::NotFound { path: path.to_string() },
        };

        let guard = match &route.guard {
            Some(guard) => guard,
            None => {
                // Signed-in users have no business on the login page
                if route.path == LOGIN_PATH && self.session.is_authenticated() {
                    return self.redirect(LANDING_PATH, None);
                }
                self.location = path.to_string();
                return Navigation::Render { path: path.to_string(), title: route.title };
            }
        };

        match guard.evaluate(&self.session, path) {
            GuardState::Checking => Navigation::Loading,
            GuardState::DeniedUnauthenticated { redirect_to, from } => {
                self.return_to = Some(from.clone());
                self.redirect(&redirect_to, Some(from))
            }
            GuardState::DeniedForbidden { denied, .. } => {
                self.location = path.to_string();
                Navigation::AccessDenied(denied)
            }
            GuardState::Allowed => {
                self.location = path.to_string();
                Navigation::Render { path: path.to_string(), title: route.title }
            }
        }
    }

    /// Continue to the page that sent the user to login, or the landing page
    pub fn complete_login(&mut self) -> Navigation {
        let target = self.return_to.take().unwrap_or_else(|| LANDING_PATH.to_string());
        self.navigate(&target)
    }

    /// After logout everything protected sends the user back to login
    pub fn after_logout(&mut self) -> Navigation {
        self.return_to = None;
        self.navigate(LOGIN_PATH)
    }

    fn redirect(&mut self, to: &str, from: Option<String>) -> Navigation {
        self.location = to.to_string();
        Navigation::Redirect { to: to.to_string(), from }
    }
}
