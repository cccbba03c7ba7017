use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::TradeType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub symbol: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl TradeRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        trade_type: TradeType,
        symbol: impl Into<String>,
        amount: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            timestamp,
            trade_type,
            symbol: symbol.into(),
            amount,
            price,
            value: amount * price,
            order_id: None,
        }
    }
}

/// One entry of `/api/volatile_coins`. Only `symbol` is required; the
/// remaining market figures are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatileCoin {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<Decimal>,
}

impl VolatileCoin {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            current_price: None,
            volume_24h: None,
            volatility: None,
            price_change_24h: None,
        }
    }
}

/// Accepts RFC 3339 as well as naive ISO-8601 timestamps, the latter read as UTC.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
