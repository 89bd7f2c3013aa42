//! Static per-feed configuration: where to connect, what to send, how to
//! normalize. Built once at startup, read-only afterwards.

use serde_json::{json, Value};

use crate::exchange::{BinanceAdapter, BybitAdapter, CoinexAdapter, ExchangeAdapter};

/// One exchange feed, shared read-only by its supervisor.
pub struct FeedConfig {
    pub name: &'static str,
    pub url: String,
    /// Sent in order after every (re)connect, before any data frame is
    /// processed.
    pub subscribe: Vec<Value>,
    /// Application-level keepalive payload, for feeds that drop idle
    /// connections.
    pub keepalive: Option<Value>,
    pub adapter: &'static dyn ExchangeAdapter,
}

pub const BINANCE_WS_URL: &str = "wss://data-stream.binance.vision/stream";
pub const BYBIT_WS_URL: &str = "wss://stream.bybit.com/v5/public/spot";
pub const COINEX_WS_URL: &str = "wss://socket.coinex.com/v2/spot";

static BINANCE: BinanceAdapter = BinanceAdapter;
static BYBIT: BybitAdapter = BybitAdapter;
static COINEX: CoinexAdapter = CoinexAdapter;

/// Built-in feed table for the given symbols (exchange-native uppercase,
/// e.g. `BTCUSDT`).
pub fn builtin_feeds(symbols: &[String]) -> Vec<FeedConfig> {
    let binance_streams: Vec<String> = symbols
        .iter()
        .map(|s| format!("{}@trade", s.to_lowercase()))
        .collect();
    let bybit_args: Vec<String> = symbols
        .iter()
        .map(|s| format!("publicTrade.{}", s.to_uppercase()))
        .collect();
    let coinex_markets: Vec<String> = symbols.iter().map(|s| s.to_uppercase()).collect();

    vec![
        FeedConfig {
            name: "binance",
            url: BINANCE_WS_URL.to_string(),
            subscribe: vec![json!({
                "method": "SUBSCRIBE",
                "params": binance_streams,
                "id": 1
            })],
            keepalive: None,
            adapter: &BINANCE,
        },
        FeedConfig {
            name: "bybit",
            url: BYBIT_WS_URL.to_string(),
            subscribe: vec![json!({
                "op": "subscribe",
                "args": bybit_args
            })],
            keepalive: None,
            adapter: &BYBIT,
        },
        FeedConfig {
            name: "coinex",
            url: COINEX_WS_URL.to_string(),
            subscribe: vec![json!({
                "method": "deals.subscribe",
                "params": {"market_list": coinex_markets},
                "id": 1
            })],
            // CoinEx times out idle connections without a server.ping.
            keepalive: Some(json!({
                "method": "server.ping",
                "params": {},
                "id": 1
            })),
            adapter: &COINEX,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<String> {
        vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
    }

    #[test]
    fn test_builtin_feed_names_match_adapters() {
        for feed in builtin_feeds(&symbols()) {
            assert_eq!(feed.name, feed.adapter.exchange());
            assert!(feed.url.starts_with("wss://"));
            assert!(!feed.subscribe.is_empty());
        }
    }

    #[test]
    fn test_binance_subscribes_to_lowercase_trade_streams() {
        let feeds = builtin_feeds(&symbols());
        let binance = &feeds[0];
        let params = binance.subscribe[0]["params"].as_array().unwrap();
        assert_eq!(params[0], "btcusdt@trade");
        assert_eq!(params[1], "ethusdt@trade");
    }

    #[test]
    fn test_bybit_subscribes_to_public_trade_topics() {
        let feeds = builtin_feeds(&symbols());
        let bybit = &feeds[1];
        let args = bybit.subscribe[0]["args"].as_array().unwrap();
        assert_eq!(args[0], "publicTrade.BTCUSDT");
    }

    #[test]
    fn test_only_coinex_has_keepalive() {
        let feeds = builtin_feeds(&symbols());
        assert!(feeds[0].keepalive.is_none());
        assert!(feeds[1].keepalive.is_none());

        let keepalive = feeds[2].keepalive.as_ref().unwrap();
        assert_eq!(keepalive["method"], "server.ping");
    }
}
