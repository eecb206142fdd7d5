//! Session context shared by everything that needs the signed-in user
//!
//! The context is created once at startup, hydrated from the [`SessionStore`]
//! by [`SessionContext::initialize`], and handed explicitly to the gateway,
//! the route guard and the views. Storage is the durable copy; the identity
//! held here is a cache of it and is only changed after storage was written.

use crate::auth::models::{Identity, Role};
use crate::auth::session::SessionStore;
use crate::core::error::{DashboardError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

pub struct SessionContext {
    store: SessionStore,
    identity: RwLock<Option<Identity>>,
    loading: AtomicBool,
}

impl SessionContext {
    /// A context that has not restored its session yet; guards report `Checking`
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            identity: RwLock::new(None),
            loading: AtomicBool::new(true),
        }
    }

    /// Create a context and restore the persisted session into it
    pub fn restored(store: SessionStore) -> Self {
        let ctx = Self::new(store);
        ctx.initialize();
        ctx
    }

    /// Hydrate the in-memory identity from storage. Runs once per startup.
    pub fn initialize(&self) {
        let restored = self.store.restore();
        if let Ok(mut identity) = self.identity.write() {
            *identity = restored;
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<Identity> {
        self.identity.read().ok().and_then(|identity| identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|identity| identity.role)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Persist and adopt a freshly authenticated identity
    pub(crate) fn establish(&self, identity: Identity) -> Result<()> {
        self.store.save(&identity)?;
        let mut slot = self
            .identity
            .write()
            .map_err(|_| DashboardError::Storage("session lock poisoned".to_string()))?;
        *slot = Some(identity);
        Ok(())
    }

    /// Drop the session from storage and memory
    pub(crate) fn end(&self) -> Result<()> {
        if let Ok(mut slot) = self.identity.write() {
            *slot = None;
        }
        self.store.clear()
    }
}
