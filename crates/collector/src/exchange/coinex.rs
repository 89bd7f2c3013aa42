//! CoinEx v2 deals normalization.
//!
//! CoinEx delivers gzip-compressed frames (decompressed by the frame
//! decoder before reaching this adapter). Trade pushes arrive as
//! `deals.update` with a `deal_list` batch; side is a lowercase string.

use serde::Deserialize;
use serde_json::Value;

use crate::exchange::{millis_to_secs, parse_decimal, ExchangeAdapter};
use crate::record::{capture_time, Side, TradeRecord};

pub const EXCHANGE: &str = "coinex";

#[derive(Debug, Deserialize)]
struct DealsUpdate {
    method: String,
    data: DealsData,
}

#[derive(Debug, Deserialize)]
struct DealsData {
    market: String,
    deal_list: Vec<Deal>,
}

#[derive(Debug, Deserialize)]
struct Deal {
    created_at: Option<u64>,
    side: String,
    price: String,
    amount: String,
}

pub struct CoinexAdapter;

impl ExchangeAdapter for CoinexAdapter {
    fn exchange(&self) -> &'static str {
        EXCHANGE
    }

    fn normalize(&self, msg: &Value) -> Vec<TradeRecord> {
        // Pong replies and subscribe acks carry a "message"/"code" body
        // instead and fail the shape.
        let update: DealsUpdate = match serde_json::from_value(msg.clone()) {
            Ok(update) => update,
            Err(_) => return Vec::new(),
        };
        if update.method != "deals.update" {
            return Vec::new();
        }
        let market = update.data.market;
        update
            .data
            .deal_list
            .into_iter()
            .filter_map(|deal| {
                let side = match deal.side.as_str() {
                    "buy" => Side::Buy,
                    "sell" => Side::Sell,
                    _ => return None,
                };
                Some(TradeRecord {
                    timestamp: deal
                        .created_at
                        .map(millis_to_secs)
                        .unwrap_or_else(capture_time),
                    exchange: EXCHANGE.to_string(),
                    symbol: market.clone(),
                    price: parse_decimal(&deal.price)?,
                    amount: parse_decimal(&deal.amount)?,
                    side,
                })
            })
            .collect()
    }
}
