//! Remote API access
//!
//! This module provides the typed HTTP client for the stroke detection
//! service and the request/response models it exchanges.

pub mod client;
pub mod models;

#[cfg(test)]
pub(crate) mod mock;

pub use client::ApiClient;
