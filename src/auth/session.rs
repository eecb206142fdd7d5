//! Persisted session identity

use crate::auth::models::Identity;
use crate::core::error::Result;
use crate::core::storage::LocalStorage;
use std::sync::Arc;

/// Storage key of the signed-in identity
pub const SESSION_KEY: &str = "stroke_dashboard.user";

/// Storage key of the username pre-filled on the login form
pub const REMEMBERED_USERNAME_KEY: &str = "stroke_dashboard.remembered_username";

/// Reads and writes the identity record in local storage
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Read the persisted identity.
    ///
    /// Absent, unreadable and unparsable entries all yield `None`; a corrupt
    /// entry is removed so the next call finds storage clean.
    pub fn restore(&self) -> Option<Identity> {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session");
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                tracing::debug!(username = %identity.username, "Restored persisted session");
                Some(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Clearing corrupt persisted session");
                if let Err(e) = self.storage.remove_item(SESSION_KEY) {
                    tracing::warn!(error = %e, "Could not clear corrupt session entry");
                }
                None
            }
        }
    }

    /// Persist the identity, replacing any previous entry
    pub fn save(&self, identity: &Identity) -> Result<()> {
        let serialized = serde_json::to_string(identity)?;
        self.storage.set_item(SESSION_KEY, &serialized)
    }

    /// Remove the persisted identity
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(SESSION_KEY)
    }

    /// Store or forget the username shown on the login form
    pub fn remember_username(&self, username: Option<&str>) -> Result<()> {
        match username {
            Some(name) if !name.is_empty() => self.storage.set_item(REMEMBERED_USERNAME_KEY, name),
            _ => self.storage.remove_item(REMEMBERED_USERNAME_KEY),
        }
    }

    pub fn remembered_username(&self) -> Option<String> {
        self.storage
            .get_item(REMEMBERED_USERNAME_KEY)
            .ok()
            .flatten()
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::core::storage::MemoryStorage;
    use proptest::prelude::*;

    fn doctor() -> Identity {
        Identity {
            id: "12".into(),
            username: "doctor".into(),
            full_name: "Dr. Amara Okafor".into(),
            role: Role::Doctor,
        }
    }

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        (storage.clone(), SessionStore::new(storage))
    }

    #[test]
    fn test_restore_empty() {
        let (_, store) = store();
        assert_eq!(store.restore(), None);
    }

    #[test]
    fn test_save_then_restore() {
        let (_, store) = store();
        store.save(&doctor()).unwrap();
        assert_eq!(store.restore(), Some(doctor()));
    }

    #[test]
    fn test_save_overwrites() {
        let (_, store) = store();
        store.save(&doctor()).unwrap();
        let admin = Identity {
            id: "1".into(),
            username: "admin".into(),
            full_name: "Administrator".into(),
            role: Role::Admin,
        };
        store.save(&admin).unwrap();
        assert_eq!(store.restore(), Some(admin));
    }

    #[test]
    fn test_clear() {
        let (storage, store) = store();
        store.save(&doctor()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.restore(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_cleared() {
        let (storage, store) = store();
        storage.set_item(SESSION_KEY, r#"{"id":"1","username":"#).unwrap();

        assert_eq!(store.restore(), None);
        assert_eq!(storage.get_item(SESSION_KEY).unwrap(), None);
        assert_eq!(store.restore(), None);
    }

    #[test]
    fn test_remembered_username() {
        let (_, store) = store();
        assert_eq!(store.remembered_username(), None);

        store.remember_username(Some("doctor")).unwrap();
        assert_eq!(store.remembered_username().as_deref(), Some("doctor"));

        store.remember_username(None).unwrap();
        assert_eq!(store.remembered_username(), None);
    }

    #[test]
    fn test_clear_keeps_remembered_username() {
        let (_, store) = store();
        store.save(&doctor()).unwrap();
        store.remember_username(Some("doctor")).unwrap();
        store.clear().unwrap();
        assert_eq!(store.remembered_username().as_deref(), Some("doctor"));
    }

    proptest! {
        #[test]
        fn prop_garbage_never_restores(raw in "\\PC*") {
            prop_assume!(serde_json::from_str::<Identity>(&raw).is_err());
            let (storage, store) = store();
            storage.set_item(SESSION_KEY, &raw).unwrap();

            prop_assert_eq!(store.restore(), None);
            prop_assert_eq!(storage.get_item(SESSION_KEY).unwrap(), None);
            prop_assert_eq!(store.restore(), None);
        }
    }
}
