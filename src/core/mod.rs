//! Core support module
//!
//! This module provides the ambient pieces every other module leans on:
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system
//! - Local key/value storage
//! - User-facing notifications
//! - In-flight flags for non-overlapping actions

pub mod config;
pub mod logging;
pub mod error;
pub mod storage;
pub mod notify;
pub mod busy;
pub mod serde_ext;

pub use config::{BuildMode, Config};
pub use logging::Logger;
pub use error::{DashboardError, Result};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use notify::{NoticeLevel, Notification};
pub use busy::BusyFlag;
