//! Route protection
//!
//! A guard is evaluated on every navigation attempt:
//!
//! ```text
//! Checking ──(session restored)──┬─ no identity ───────────► DeniedUnauthenticated (redirect to login, keep `from`)
//!                                ├─ role not in allow-set ─► DeniedForbidden (access-denied view, manual way back)
//!                                └─ otherwise ─────────────► Allowed
//! ```
//!
//! Nothing redirects while the session is still being restored.

use crate::auth::context::SessionContext;
use crate::auth::models::Role;
use serde::Serialize;

/// Where unauthenticated visitors are sent
pub const LOGIN_PATH: &str = "/login";

/// Default landing page after login and the way back from an access-denied view
pub const LANDING_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protection {
    /// Any signed-in user
    Authenticated,
    /// Signed-in user whose role is in the allow-set
    Roles(Vec<Role>),
}

/// What the front end shows instead of a forbidden page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDenied {
    pub title: String,
    pub message: String,
    pub back_label: String,
    pub back_to: String,
}

impl AccessDenied {
    fn for_path(requested: &str) -> Self {
        Self {
            title: "Access denied".to_string(),
            message: format!("You do not have permission to view {}.", requested),
            back_label: "Back to dashboard".to_string(),
            back_to: LANDING_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    DeniedUnauthenticated { redirect_to: String, from: String },
    DeniedForbidden { landing: String, denied: AccessDenied },
    Allowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    protection: Protection,
}

impl RouteGuard {
    pub fn authenticated() -> Self {
        Self {
            protection: Protection::Authenticated,
        }
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            protection: Protection::Roles(roles.into_iter().collect()),
        }
    }

    pub fn protection(&self) -> &Protection {
        &self.protection
    }

    pub fn evaluate(&self, session: &SessionContext, requested: &str) -> GuardState {
        if session.is_loading() {
            return GuardState::Checking;
        }

        let identity = match session.current() {
            Some(identity) => identity,
            None => {
                tracing::debug!(path = %requested, "Unauthenticated visit, redirecting to login");
                return GuardState::DeniedUnauthenticated {
                    redirect_to: LOGIN_PATH.to_string(),
                    from: requested.to_string(),
                };
            }
        };

        if let Protection::Roles(allowed) = &self.protection {
            let permitted = identity.role.is_known() && allowed.contains(&identity.role);
            if !permitted {
                tracing::warn!(
                    path = %requested,
                    user_id = %identity.id,
                    role = %identity.role,
                    "Access denied"
                );
                return GuardState::DeniedForbidden {
                    landing: LANDING_PATH.to_string(),
                    denied: AccessDenied::for_path(requested),
                };
            }
        }

        GuardState::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Identity;
    use crate::auth::session::SessionStore;
    use crate::core::storage::MemoryStorage;
    use std::sync::Arc;

    fn session_with(role: Option<Role>) -> SessionContext {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        if let Some(role) = role {
            store
                .save(&Identity {
                    id: "1".into(),
                    username: "user".into(),
                    full_name: String::new(),
                    role,
                })
                .unwrap();
        }
        SessionContext::restored(store)
    }

    #[test]
    fn test_checking_while_loading() {
        let session = SessionContext::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        assert_eq!(
            RouteGuard::authenticated().evaluate(&session, "/patients"),
            GuardState::Checking
        );
        assert_eq!(
            RouteGuard::roles([Role::Admin]).evaluate(&session, "/users"),
            GuardState::Checking
        );
    }

    #[test]
    fn test_unauthenticated_redirects_with_from() {
        let session = session_with(None);
        assert_eq!(
            RouteGuard::roles([Role::Admin]).evaluate(&session, "/users"),
            GuardState::DeniedUnauthenticated {
                redirect_to: LOGIN_PATH.to_string(),
                from: "/users".to_string(),
            }
        );
    }

    #[test]
    fn test_doctor_forbidden_on_admin_route() {
        let session = session_with(Some(Role::Doctor));
        match RouteGuard::roles([Role::Admin]).evaluate(&session, "/users") {
            GuardState::DeniedForbidden { landing, denied } => {
                assert_eq!(landing, LANDING_PATH);
                assert_eq!(denied.back_to, LANDING_PATH);
                assert!(denied.message.contains("/users"));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_allowed() {
        let session = session_with(Some(Role::Admin));
        assert_eq!(
            RouteGuard::roles([Role::Admin]).evaluate(&session, "/users"),
            GuardState::Allowed
        );
        assert_eq!(
            RouteGuard::authenticated().evaluate(&session, "/patients"),
            GuardState::Allowed
        );
    }

    #[test]
    fn test_unknown_role_is_never_privileged() {
        let nurse = Role::Other("nurse".into());
        let session = session_with(Some(nurse.clone()));

        assert_eq!(
            RouteGuard::authenticated().evaluate(&session, "/patients"),
            GuardState::Allowed
        );
        assert!(matches!(
            RouteGuard::roles([nurse]).evaluate(&session, "/users"),
            GuardState::DeniedForbidden { .. }
        ));
    }
}
