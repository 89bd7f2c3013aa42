//! tickcap-collector: trade stream capture runtime components
//!
//! Connects to exchange websocket feeds, normalizes heterogeneous trade
//! events into a common record, and appends them to per-(exchange, symbol)
//! CSV files.

pub mod buffer;
pub mod decode;
pub mod error;
pub mod exchange;
pub mod feed;
pub mod flush;
pub mod record;
pub mod shutdown;
pub mod supervisor;

pub use buffer::{BufferStore, DEFAULT_BUFFER_THRESHOLD};
pub use decode::{decode_frame, RawFrame};
pub use error::{DecodeError, FlushError, TransportError};
pub use exchange::ExchangeAdapter;
pub use feed::{builtin_feeds, FeedConfig};
pub use flush::{run_flush_timer, FlushEngine, CSV_HEADER};
pub use record::{BufferKey, Side, TradeRecord};
pub use supervisor::{FeedSupervisor, RetryPolicy};
