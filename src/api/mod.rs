pub mod client;
pub mod envelope;
pub mod error;

pub use client::*;
pub use envelope::*;
pub use error::*;

use async_trait::async_trait;

use crate::types::{PerformanceSnapshot, StartTradingRequest, TradeRecord, TradingStatus, VolatileCoin};

/// The dashboard backend. Every call yields either the unwrapped payload or
/// an [`ApiError`] covering transport, decode and rejection failures alike.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn performance(&self) -> Result<PerformanceSnapshot, ApiError>;
    async fn recent_trades(&self) -> Result<Vec<TradeRecord>, ApiError>;
    async fn trading_status(&self) -> Result<TradingStatus, ApiError>;
    /// Returns the backend's confirmation message.
    async fn start_trading(&self, request: StartTradingRequest) -> Result<String, ApiError>;
    /// Returns the backend's confirmation message.
    async fn stop_trading(&self) -> Result<String, ApiError>;
    async fn volatile_coins(&self) -> Result<Vec<VolatileCoin>, ApiError>;
}
