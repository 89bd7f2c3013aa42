use thiserror::Error;

/// Connection-level failures. Never fatal: the supervisor reconnects
/// after a fixed delay.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("connection closed")]
    ConnectionClosed,
}

/// Per-frame decode failures. The offending frame is discarded and the
/// stream continues with the next one.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("gzip decompression failed: {0}")]
    Compression(#[source] std::io::Error),
    #[error("invalid utf-8 payload: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("json parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Output file failures during a flush. The drained batch is dropped,
/// not re-buffered.
#[derive(Error, Debug)]
pub enum FlushError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
