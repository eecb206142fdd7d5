//! In-flight flag for user actions that must not overlap

use crate::core::error::{DashboardError, Result};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Set the flag for the lifetime of the returned guard.
    ///
    /// Fails with [`DashboardError::Busy`] when the action is already running.
    pub fn acquire(&self, action: &str) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| DashboardError::Busy(format!("{} is already in progress", action)))?;
        Ok(BusyGuard { flag: &self.busy })
    }
}

/// Clears the flag when dropped, including on early return and error paths
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
