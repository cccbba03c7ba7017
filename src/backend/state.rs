use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::BackendSettings;
use crate::types::{PerformanceSnapshot, StartTradingRequest, TradeRecord, TradeType, VolatileCoin};

const MAX_RECENT_TRADES: usize = 50;

/// Start/stop bookkeeping for the demo backend.
pub struct TradingSession {
    is_trading: AtomicBool,
    started_at: RwLock<Option<DateTime<Utc>>>,
    active: RwLock<Option<StartTradingRequest>>,
}

impl TradingSession {
    pub fn new() -> Self {
        Self {
            is_trading: AtomicBool::new(false),
            started_at: RwLock::new(None),
            active: RwLock::new(None),
        }
    }

    pub async fn start(&self, request: StartTradingRequest) -> Result<(), String> {
        if self.is_trading.swap(true, Ordering::AcqRel) {
            return Err("Trading is already running".to_string());
        }

        info!(
            "Trading started: strategy={}, symbol={}, timeframe={}",
            request.strategy, request.symbol, request.timeframe
        );
        *self.started_at.write().await = Some(Utc::now());
        *self.active.write().await = Some(request);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), String> {
        if !self.is_trading.swap(false, Ordering::AcqRel) {
            return Err("Trading is not running".to_string());
        }

        *self.started_at.write().await = None;
        *self.active.write().await = None;
        info!("Trading stopped");
        Ok(())
    }

    pub fn is_trading(&self) -> bool {
        self.is_trading.load(Ordering::Acquire)
    }

    pub async fn active_request(&self) -> Option<StartTradingRequest> {
        self.active.read().await.clone()
    }

    pub async fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read().await
    }
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Records trades and derives the performance summary from them.
#[derive(Debug, Clone)]
pub struct TradeTracker {
    initial_balance: Decimal,
    trades: Vec<TradeRecord>,
}

impl TradeTracker {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            trades: Vec::new(),
        }
    }

    pub fn record(&mut self, trade: TradeRecord) {
        info!(
            "Trade recorded: {} {} {} @ ${:.2}",
            trade.trade_type, trade.amount, trade.symbol, trade.price
        );
        self.trades.push(trade);
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Vec<TradeRecord> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }

    pub fn performance(&self) -> PerformanceSnapshot {
        let hundred = Decimal::from(100);
        let buy_value: Decimal = self
            .trades
            .iter()
            .filter(|t| t.trade_type == TradeType::Buy)
            .map(|t| t.value)
            .sum();
        let sell_value: Decimal = self
            .trades
            .iter()
            .filter(|t| t.trade_type == TradeType::Sell)
            .map(|t| t.value)
            .sum();

        let total_pnl_percentage = if buy_value > Decimal::ZERO && sell_value > Decimal::ZERO {
            (sell_value - buy_value) / buy_value * hundred
        } else {
            Decimal::ZERO
        };

        // A sell wins when it closes above the last buy of the same symbol.
        let mut last_buy: HashMap<&str, Decimal> = HashMap::new();
        let mut sells = 0u64;
        let mut wins = 0u64;
        for trade in &self.trades {
            match trade.trade_type {
                TradeType::Buy => {
                    last_buy.insert(trade.symbol.as_str(), trade.price);
                }
                TradeType::Sell => {
                    sells += 1;
                    if last_buy.get(trade.symbol.as_str()).is_some_and(|entry| trade.price > *entry) {
                        wins += 1;
                    }
                }
            }
        }
        let win_rate = if sells == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(wins) / Decimal::from(sells) * hundred
        };

        PerformanceSnapshot {
            total_pnl_percentage: total_pnl_percentage.round_dp(4),
            win_rate: win_rate.round_dp(4),
            total_trades: self.trades.len() as u64,
            current_balance: self.initial_balance + sell_value - buy_value,
        }
    }
}

/// Shared state of the demo backend.
#[derive(Clone)]
pub struct BackendState {
    pub session: Arc<TradingSession>,
    pub tracker: Arc<RwLock<TradeTracker>>,
    pub volatile_coins: Arc<Vec<VolatileCoin>>,
}

impl BackendState {
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            session: Arc::new(TradingSession::new()),
            tracker: Arc::new(RwLock::new(TradeTracker::new(settings.initial_balance))),
            volatile_coins: Arc::new(
                settings
                    .volatile_coins
                    .iter()
                    .map(VolatileCoin::new)
                    .collect(),
            ),
        }
    }

    pub async fn record_trade(&self, trade: TradeRecord) {
        self.tracker.write().await.record(trade);
    }

    pub async fn recent_trades(&self) -> Vec<TradeRecord> {
        self.tracker.read().await.recent(MAX_RECENT_TRADES)
    }

    pub async fn performance(&self) -> PerformanceSnapshot {
        self.tracker.read().await.performance()
    }
}
