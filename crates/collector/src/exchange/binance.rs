//! Binance combined-stream trade normalization.
//!
//! Combined-stream frames wrap the event payload:
//! `{"stream":"btcusdt@trade","data":{"e":"trade",...}}`.
//! Side convention: `m` (buyer is market maker) true means the resting
//! order was the buy, so the aggressor sold.

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::{millis_to_secs, parse_decimal, ExchangeAdapter};
use crate::record::{capture_time, Side, TradeRecord};

pub const EXCHANGE: &str = "binance";

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[allow(dead_code)]
    stream: String,
    data: TradeEvent,
}

#[derive(Debug, Deserialize)]
struct TradeEvent {
    #[serde(rename = "e")]
    event: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    qty: String,
    #[serde(rename = "T")]
    trade_time_ms: Option<u64>,
    #[serde(rename = "m")]
    buyer_is_maker: bool,
}

pub struct BinanceAdapter;

impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> &'static str {
        EXCHANGE
    }

    fn normalize(&self, msg: &Value) -> Vec<TradeRecord> {
        // Subscribe acks ({"result":null,"id":1}) and other control frames
        // fail the envelope shape and yield nothing.
        let envelope: StreamEnvelope = match serde_json::from_value(msg.clone()) {
            Ok(envelope) => envelope,
            Err(_) => return Vec::new(),
        };
        let event = envelope.data;
        if event.event != "trade" {
            return Vec::new();
        }
        let (Some(price), Some(amount)) = (parse_decimal(&event.price), parse_decimal(&event.qty))
        else {
            return Vec::new();
        };
        vec![TradeRecord {
            timestamp: event
                .trade_time_ms
                .map(millis_to_secs)
                .unwrap_or_else(capture_time),
            exchange: EXCHANGE.to_string(),
            symbol: event.symbol,
            price,
            amount,
            side: if event.buyer_is_maker {
                Side::Sell
            } else {
                Side::Buy
            },
        }]
    }
}
