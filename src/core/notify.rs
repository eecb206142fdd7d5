//! Transient user-facing notices
//!
//! Errors never escape a user action: the action's boundary turns them into a
//! [`Notification`] which the front end shows and then forgets.

use crate::core::error::DashboardError;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Convert a failed action into the notice shown to the user
    pub fn from_error(error: &DashboardError) -> Self {
        tracing::debug!(error_type = error.error_type(), error = %error, "Action failed");
        let level = match error {
            DashboardError::Validation(_) | DashboardError::Busy(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self::new(level, error.user_message())
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}
