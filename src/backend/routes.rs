use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use super::BackendState;
use crate::api::{
    Envelope, VolatileCoinsEnvelope, PERFORMANCE_PATH, RECENT_TRADES_PATH, START_TRADING_PATH,
    STOP_TRADING_PATH, TRADING_STATUS_PATH, VOLATILE_COINS_PATH,
};
use crate::types::{StartTradingRequest, TradingStatus};

pub fn router(state: BackendState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(PERFORMANCE_PATH, get(get_performance))
        .route(RECENT_TRADES_PATH, get(get_recent_trades))
        .route(TRADING_STATUS_PATH, get(get_trading_status))
        .route(START_TRADING_PATH, post(post_start_trading))
        .route(STOP_TRADING_PATH, post(post_stop_trading))
        .route(VOLATILE_COINS_PATH, get(get_volatile_coins))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: BackendState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Demo backend listening on http://localhost:{}", port);
    serve_on(listener, state).await
}

pub async fn serve_on(listener: TcpListener, state: BackendState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn get_performance(State(state): State<BackendState>) -> impl IntoResponse {
    Json(Envelope::ok(state.performance().await))
}

async fn get_recent_trades(State(state): State<BackendState>) -> impl IntoResponse {
    Json(Envelope::ok(state.recent_trades().await))
}

async fn get_trading_status(State(state): State<BackendState>) -> impl IntoResponse {
    Json(Envelope::ok(TradingStatus {
        is_trading: state.session.is_trading(),
    }))
}

async fn post_start_trading(
    State(state): State<BackendState>,
    Json(request): Json<StartTradingRequest>,
) -> impl IntoResponse {
    match state.session.start(request).await {
        Ok(()) => (StatusCode::OK, Json(Envelope::<serde_json::Value>::acknowledged("Trading started"))).into_response(),
        Err(e) => {
            warn!("Start rejected: {}", e);
            (StatusCode::BAD_REQUEST, Json(Envelope::<serde_json::Value>::failure(e))).into_response()
        }
    }
}

async fn post_stop_trading(State(state): State<BackendState>) -> impl IntoResponse {
    match state.session.stop().await {
        Ok(()) => (StatusCode::OK, Json(Envelope::<serde_json::Value>::acknowledged("Trading stopped"))).into_response(),
        Err(e) => {
            warn!("Stop rejected: {}", e);
            (StatusCode::BAD_REQUEST, Json(Envelope::<serde_json::Value>::failure(e))).into_response()
        }
    }
}

async fn get_volatile_coins(State(state): State<BackendState>) -> impl IntoResponse {
    Json(VolatileCoinsEnvelope {
        success: true,
        coins: Some(state.volatile_coins.as_ref().clone()),
        data: None,
        message: None,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DashboardApi, HttpDashboardApi};
    use crate::config::{BackendSettings, Settings};
    use crate::dashboard::{DashboardController, TradingState};
    use crate::types::{TradeRecord, TradeType};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> BackendState {
        BackendState::new(&BackendSettings::default())
    }

    async fn call(app: Router, method: Method, path: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_and_performance_endpoints() {
        let state = state();
        state
            .record_trade(TradeRecord::new(Utc::now(), TradeType::Buy, "BTC/USDT:USDT", dec!(0.1), dec!(60000)))
            .await;

        let (status, body) = call(router(state.clone()), Method::GET, TRADING_STATUS_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["is_trading"], false);

        let (_, body) = call(router(state.clone()), Method::GET, PERFORMANCE_PATH, None).await;
        assert_eq!(body["data"]["total_trades"], 1);
        assert_eq!(body["data"]["current_balance"], 4000.0);

        let (_, body) = call(router(state), Method::GET, RECENT_TRADES_PATH, None).await;
        assert_eq!(body["data"][0]["type"], "BUY");
        assert_eq!(body["data"][0]["symbol"], "BTC/USDT:USDT");
    }

    #[tokio::test]
    async fn test_start_stop_round_trip() {
        let state = state();
        let start = r#"{"strategy":"ma","symbol":"BTC/USDT:USDT","timeframe":"1h"}"#;

        let (status, body) = call(router(state.clone()), Method::POST, START_TRADING_PATH, Some(start)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Trading started");
        assert!(state.session.is_trading());

        let (status, body) = call(router(state.clone()), Method::POST, START_TRADING_PATH, Some(start)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Trading is already running");

        let (_, body) = call(router(state.clone()), Method::POST, STOP_TRADING_PATH, None).await;
        assert_eq!(body["success"], true);

        let (_, body) = call(router(state), Method::POST, STOP_TRADING_PATH, None).await;
        assert_eq!(body["error"], "Trading is not running");
    }

    #[tokio::test]
    async fn test_volatile_coins_listed_under_coins() {
        let (_, body) = call(router(state()), Method::GET, VOLATILE_COINS_PATH, None).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["coins"][0]["symbol"], "DOGE/USDT:USDT");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_trades_round_trip_through_http_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = state();
        backend
            .record_trade(TradeRecord::new(Utc::now(), TradeType::Buy, "SOL/USDT:USDT", dec!(2), dec!(150)))
            .await;
        backend
            .record_trade(TradeRecord::new(Utc::now(), TradeType::Sell, "SOL/USDT:USDT", dec!(2), dec!(165)))
            .await;
        tokio::spawn(serve_on(listener, backend));

        let api = HttpDashboardApi::with_client(reqwest::Client::new(), &format!("http://{}", addr));
        let trades = api.recent_trades().await.unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].trade_type, TradeType::Sell);
        assert_eq!(trades[1].trade_type, TradeType::Buy);
        assert_eq!(trades[0].value, dec!(330));

        let raw = reqwest::get(format!("http://{}{}", addr, RECENT_TRADES_PATH))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(raw.contains(r#""type":"SELL""#));
        assert!(raw.contains(r#""type":"BUY""#));
    }

    #[tokio::test]
    async fn test_controller_against_live_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = state();
        tokio::spawn(serve_on(listener, backend.clone()));

        let api = HttpDashboardApi::with_client(reqwest::Client::new(), &format!("http://{}", addr));
        assert!(!api.trading_status().await.unwrap().is_trading);

        let mut settings = Settings::default();
        settings.polling.sync_status_on_poll = false;
        let controller = DashboardController::new(Arc::new(api), &settings);
        controller.initialize().await;
        assert_eq!(controller.trading_state(), TradingState::Idle);

        assert!(controller
            .start_trading(StartTradingRequest::new("rsi", "ETH/USDT:USDT", "5m"))
            .await);
        assert_eq!(controller.cadence(), Some(TradingState::Active));
        assert!(backend.session.is_trading());

        // Backend refuses the second start; the controller stays active.
        assert!(!controller
            .start_trading(StartTradingRequest::new("rsi", "ETH/USDT:USDT", "5m"))
            .await);
        let notice = controller.view().notification.unwrap();
        assert_eq!(notice.message, "Failed to start trading: Trading is already running");
        assert!(controller.is_trading());

        assert!(controller.stop_trading().await);
        assert_eq!(controller.cadence(), Some(TradingState::Idle));

        controller.load_volatile_coins().await;
        let options = controller.view().symbol_options;
        assert!(options.iter().any(|o| o.value.as_deref() == Some("PEPE/USDT:USDT")));

        controller.shutdown();
    }
}
