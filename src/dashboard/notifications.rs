use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::api::ApiError;

/// Banner style, mirroring the alert classes of the dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Danger => write!(f, "danger"),
        }
    }
}

/// A transient banner. At most one is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Danger, message)
    }

    pub fn log(&self) {
        match self.kind {
            NotificationKind::Success => info!("{}", self.message),
            NotificationKind::Danger => warn!("{}", self.message),
        }
    }
}

/// Which user action a failure notification reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingAction {
    Start,
    Stop,
}

impl TradingAction {
    fn verb(&self) -> &'static str {
        match self {
            TradingAction::Start => "start",
            TradingAction::Stop => "stop",
        }
    }

    fn gerund(&self) -> &'static str {
        match self {
            TradingAction::Start => "starting",
            TradingAction::Stop => "stopping",
        }
    }
}

/// Rejections quote the backend's error; transport and decode failures get a
/// generic message.
pub fn action_failed(action: TradingAction, err: &ApiError) -> Notification {
    let message = if err.is_rejection() {
        format!("Failed to {} trading: {}", action.verb(), err)
    } else {
        format!("An error occurred while {} trading.", action.gerund())
    };
    Notification::danger(message)
}
