//! Per-exchange normalization of parsed feed messages.

mod binance;
mod bybit;
mod coinex;

pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use coinex::CoinexAdapter;

use serde_json::Value;

use crate::record::TradeRecord;

/// Normalizes one parsed feed message into canonical trade records.
///
/// A single message may carry a batch of trades. Control frames, acks and
/// shapes the adapter does not recognize yield an empty vec, never an
/// error. Adapters never write output themselves.
pub trait ExchangeAdapter: Send + Sync {
    /// Exchange identifier used in record fields and output paths.
    fn exchange(&self) -> &'static str;

    fn normalize(&self, msg: &Value) -> Vec<TradeRecord>;
}

/// Parse an exchange decimal string like `"42000.50"`.
pub(crate) fn parse_decimal(s: &str) -> Option<f64> {
    s.parse().ok()
}

pub(crate) fn millis_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
