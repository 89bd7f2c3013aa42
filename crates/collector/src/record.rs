use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Taker side of a trade, normalized across exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one buffer and one output file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferKey {
    pub exchange: String,
    pub symbol: String,
}

impl BufferKey {
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
        }
    }
}

/// Canonical trade record shared across all exchanges.
/// Immutable once constructed; lives from adapter output until its buffer
/// is drained and written.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    /// Event time in epoch seconds, exchange-supplied when available,
    /// capture time otherwise.
    pub timestamp: f64,
    pub exchange: String,
    pub symbol: String,
    pub price: f64,
    pub amount: f64,
    pub side: Side,
}

impl TradeRecord {
    pub fn key(&self) -> BufferKey {
        BufferKey::new(self.exchange.clone(), self.symbol.clone())
    }
}

/// Current wall clock as fractional epoch seconds.
pub fn capture_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
