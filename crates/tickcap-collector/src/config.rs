use std::path::PathBuf;

use clap::Parser;

/// tickcap-collector: exchange trade stream capture
#[derive(Parser, Debug)]
#[command(name = "tickcap-collector")]
pub struct Config {
    /// Base directory for captured CSV files
    #[arg(long, env = "TICKCAP_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Symbols to capture on every feed
    #[arg(
        long,
        env = "TICKCAP_SYMBOLS",
        default_value = "BTCUSDT,ETHUSDT",
        value_delimiter = ','
    )]
    pub symbols: Vec<String>,

    /// Records buffered per (exchange, symbol) before a flush is forced
    #[arg(long, env = "TICKCAP_BUFFER_THRESHOLD", default_value = "500")]
    pub buffer_threshold: usize,

    /// Seconds between periodic flushes of every buffer
    #[arg(long, env = "TICKCAP_FLUSH_INTERVAL_SECS", default_value = "5")]
    pub flush_interval_secs: u64,

    /// Seconds to wait before reconnecting a failed feed
    #[arg(long, env = "TICKCAP_RECONNECT_DELAY_SECS", default_value = "5")]
    pub reconnect_delay_secs: u64,

    /// Seconds between keepalive pings on each connection
    #[arg(long, env = "TICKCAP_KEEPALIVE_INTERVAL_SECS", default_value = "30")]
    pub keepalive_interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["tickcap-collector"]);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.buffer_threshold, 500);
        assert_eq!(config.flush_interval_secs, 5);
        assert_eq!(config.reconnect_delay_secs, 5);
        assert_eq!(config.keepalive_interval_secs, 30);
    }

    #[test]
    fn test_symbol_list_splits_on_commas() {
        let config =
            Config::parse_from(["tickcap-collector", "--symbols", "SOLUSDT,XRPUSDT,BTCUSDT"]);
        assert_eq!(config.symbols, vec!["SOLUSDT", "XRPUSDT", "BTCUSDT"]);
    }
}
