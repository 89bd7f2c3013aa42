//! Bybit v5 public trade normalization.
//!
//! `publicTrade.<SYMBOL>` topic messages batch trades in a `data` array
//! with an explicit `S` side string (`Buy`/`Sell`).

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::{millis_to_secs, parse_decimal, ExchangeAdapter};
use crate::record::{capture_time, Side, TradeRecord};

pub const EXCHANGE: &str = "bybit";

#[derive(Debug, Deserialize)]
struct PublicTradeMessage {
    topic: String,
    data: Vec<TradeEntry>,
}

#[derive(Debug, Deserialize)]
struct TradeEntry {
    #[serde(rename = "T")]
    trade_time_ms: Option<u64>,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "S")]
    side: String,
    #[serde(rename = "v")]
    qty: String,
    #[serde(rename = "p")]
    price: String,
}

pub struct BybitAdapter;

impl ExchangeAdapter for BybitAdapter {
    fn exchange(&self) -> &'static str {
        EXCHANGE
    }

    fn normalize(&self, msg: &Value) -> Vec<TradeRecord> {
        // Subscribe acks ({"success":true,"op":"subscribe",...}) have no
        // data array and fail the shape.
        let message: PublicTradeMessage = match serde_json::from_value(msg.clone()) {
            Ok(message) => message,
            Err(_) => return Vec::new(),
        };
        if !message.topic.starts_with("publicTrade") {
            return Vec::new();
        }
        message
            .data
            .into_iter()
            .filter_map(|entry| {
                let side = if entry.side.eq_ignore_ascii_case("buy") {
                    Side::Buy
                } else if entry.side.eq_ignore_ascii_case("sell") {
                    Side::Sell
                } else {
                    return None;
                };
                Some(TradeRecord {
                    timestamp: entry
                        .trade_time_ms
                        .map(millis_to_secs)
                        .unwrap_or_else(capture_time),
                    exchange: EXCHANGE.to_string(),
                    symbol: entry.symbol,
                    price: parse_decimal(&entry.price)?,
                    amount: parse_decimal(&entry.qty)?,
                    side,
                })
            })
            .collect()
    }
}
