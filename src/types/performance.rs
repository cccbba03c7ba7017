use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate performance as reported by `/api/performance`. Each refresh
/// replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_pnl_percentage: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub win_rate: Decimal,
    pub total_trades: u64,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub current_balance: Decimal,
}

/// Payload of `/api/trading_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingStatus {
    pub is_trading: bool,
}

/// Body of `/api/start_trading`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTradingRequest {
    pub strategy: String,
    pub symbol: String,
    pub timeframe: String,
}

impl StartTradingRequest {
    pub fn new(strategy: impl Into<String>, symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}
