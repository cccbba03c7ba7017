//! Scripted in-memory backend for controller tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::api::{ApiError, DashboardApi};
use crate::types::{
    PerformanceSnapshot, StartTradingRequest, TradeRecord, TradeType, TradingStatus, VolatileCoin,
};

pub struct FakeApi {
    pub performance: Mutex<PerformanceSnapshot>,
    pub trades: Mutex<Vec<TradeRecord>>,
    pub volatile: Mutex<Vec<VolatileCoin>>,
    pub is_trading: AtomicBool,

    pub fail_performance: AtomicBool,
    pub fail_trades: AtomicBool,
    pub fail_status: AtomicBool,
    pub fail_volatile: AtomicBool,
    pub break_stop: AtomicBool,
    pub reject_start: Mutex<Option<String>>,
    /// Status reads capture the flag when called and answer after this delay.
    pub status_delay: Mutex<Option<Duration>>,
    start_gate: Mutex<Option<Arc<Semaphore>>>,

    pub performance_calls: AtomicUsize,
    pub trades_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub volatile_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        Self {
            performance: Mutex::new(PerformanceSnapshot {
                total_pnl_percentage: dec!(12.345),
                win_rate: dec!(75),
                total_trades: 4,
                current_balance: dec!(11234.5),
            }),
            trades: Mutex::new(vec![
                TradeRecord::new(ts, TradeType::Buy, "BTC/USDT:USDT", dec!(0.01), dec!(60000)),
                TradeRecord::new(ts, TradeType::Sell, "BTC/USDT:USDT", dec!(0.01), dec!(61000)),
            ]),
            volatile: Mutex::new(vec![
                VolatileCoin::new("DOGE/USDT:USDT"),
                VolatileCoin::new("PEPE/USDT:USDT"),
            ]),
            is_trading: AtomicBool::new(false),
            fail_performance: AtomicBool::new(false),
            fail_trades: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            fail_volatile: AtomicBool::new(false),
            break_stop: AtomicBool::new(false),
            reject_start: Mutex::new(None),
            status_delay: Mutex::new(None),
            start_gate: Mutex::new(None),
            performance_calls: AtomicUsize::new(0),
            trades_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            volatile_calls: AtomicUsize::new(0),
        }
    }

    /// Holds every start request until a permit is added to the returned
    /// semaphore; each permit releases one request.
    pub fn gate_start(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.start_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn unreachable() -> ApiError {
        match serde_json::from_str::<u8>("<html>") {
            Err(e) => ApiError::Decode(e),
            Ok(_) => ApiError::MissingData("body"),
        }
    }
}

#[async_trait]
impl DashboardApi for FakeApi {
    async fn performance(&self) -> Result<PerformanceSnapshot, ApiError> {
        self.performance_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_performance.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(self.performance.lock().unwrap().clone())
    }

    async fn recent_trades(&self) -> Result<Vec<TradeRecord>, ApiError> {
        self.trades_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_trades.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("database unavailable".to_string()));
        }
        Ok(self.trades.lock().unwrap().clone())
    }

    async fn trading_status(&self) -> Result<TradingStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        let is_trading = self.is_trading.load(Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(TradingStatus { is_trading })
    }

    async fn start_trading(&self, _request: StartTradingRequest) -> Result<String, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.start_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(reason) = self.reject_start.lock().unwrap().clone() {
            return Err(ApiError::Rejected(reason));
        }
        self.is_trading.store(true, Ordering::SeqCst);
        Ok("Trading started".to_string())
    }

    async fn stop_trading(&self) -> Result<String, ApiError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.break_stop.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        self.is_trading.store(false, Ordering::SeqCst);
        Ok("Trading stopped".to_string())
    }

    async fn volatile_coins(&self) -> Result<Vec<VolatileCoin>, ApiError> {
        self.volatile_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_volatile.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(self.volatile.lock().unwrap().clone())
    }
}
