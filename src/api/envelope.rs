use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::types::VolatileCoin;

const UNKNOWN_ERROR: &str = "unknown error";

/// Uniform wrapper returned by every backend endpoint:
/// `{ "success": bool, "data" | "message" | "error": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Unwraps the payload of a successful envelope.
    pub fn into_data(self, what: &'static str) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        self.data.ok_or(ApiError::MissingData(what))
    }

    /// Unwraps the confirmation message of a command endpoint.
    pub fn into_message(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(self.rejection());
        }
        Ok(self.message.unwrap_or_default())
    }

    fn rejection(self) -> ApiError {
        rejected_with(self.error, self.message)
    }
}

/// `error` wins over `message`; neither yields a generic reason.
fn rejected_with(error: Option<String>, message: Option<String>) -> ApiError {
    ApiError::Rejected(error.or(message).unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
}

impl Envelope<serde_json::Value> {
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }
}

/// The volatile-coin endpoint has shipped the list under both `coins` and
/// `data`; `coins` takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatileCoinsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<Vec<VolatileCoin>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<VolatileCoin>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VolatileCoinsEnvelope {
    pub fn into_coins(self) -> Result<Vec<VolatileCoin>, ApiError> {
        if !self.success {
            return Err(rejected_with(self.error, self.message));
        }
        self.coins
            .or(self.data)
            .ok_or(ApiError::MissingData("volatile coins"))
    }
}
