use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{ApiError, DashboardApi, Envelope, VolatileCoinsEnvelope};
use crate::config::ApiSettings;
use crate::types::{PerformanceSnapshot, StartTradingRequest, TradeRecord, TradingStatus, VolatileCoin};

pub const PERFORMANCE_PATH: &str = "/api/performance";
pub const RECENT_TRADES_PATH: &str = "/api/recent_trades";
pub const TRADING_STATUS_PATH: &str = "/api/trading_status";
pub const START_TRADING_PATH: &str = "/api/start_trading";
pub const STOP_TRADING_PATH: &str = "/api/stop_trading";
pub const VOLATILE_COINS_PATH: &str = "/api/volatile_coins";

/// `reqwest`-backed [`DashboardApi`]. Bodies are decoded as envelopes
/// regardless of HTTP status, since the backend reports failures in-band.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;
        Ok(Self::with_client(client, &settings.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let body = self.client.get(&url).send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: Option<&StartTradingRequest>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let request = self.client.post(&url);
        let request = match payload {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        let body = request.send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn performance(&self) -> Result<PerformanceSnapshot, ApiError> {
        self.get::<Envelope<PerformanceSnapshot>>(PERFORMANCE_PATH)
            .await?
            .into_data("performance")
    }

    async fn recent_trades(&self) -> Result<Vec<TradeRecord>, ApiError> {
        self.get::<Envelope<Vec<TradeRecord>>>(RECENT_TRADES_PATH)
            .await?
            .into_data("trades")
    }

    async fn trading_status(&self) -> Result<TradingStatus, ApiError> {
        self.get::<Envelope<TradingStatus>>(TRADING_STATUS_PATH)
            .await?
            .into_data("trading status")
    }

    async fn start_trading(&self, request: StartTradingRequest) -> Result<String, ApiError> {
        self.post::<Envelope<serde_json::Value>>(START_TRADING_PATH, Some(&request))
            .await?
            .into_message()
    }

    async fn stop_trading(&self) -> Result<String, ApiError> {
        self.post::<Envelope<serde_json::Value>>(STOP_TRADING_PATH, None)
            .await?
            .into_message()
    }

    async fn volatile_coins(&self) -> Result<Vec<VolatileCoin>, ApiError> {
        self.get::<VolatileCoinsEnvelope>(VOLATILE_COINS_PATH)
            .await?
            .into_coins()
    }
}
