//! Flush engine: drains buffered records and appends them as CSV rows to
//! per-(exchange, symbol) files.
//!
//! Loss policy: a batch that fails to write is dropped and logged, never
//! re-buffered. The loss window is bounded by the buffer threshold and
//! the periodic flush interval.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::buffer::BufferStore;
use crate::error::FlushError;
use crate::record::{BufferKey, TradeRecord};

/// First line of every output file, written exactly once.
pub const CSV_HEADER: &str = "timestamp,exchange,symbol,price,amount,side";

/// Owns the buffer store and the output files.
///
/// Feed supervisors push records through [`FlushEngine::ingest`]; the
/// periodic timer and the threshold trigger both land in
/// [`FlushEngine::flush`], which drains while holding the file lock so
/// the two triggers cannot reorder batches within one file.
pub struct FlushEngine {
    store: BufferStore,
    base_dir: PathBuf,
    files: Mutex<HashMap<BufferKey, BufWriter<File>>>,
}

impl FlushEngine {
    pub fn new(base_dir: impl Into<PathBuf>, store: BufferStore) -> Self {
        Self {
            store,
            base_dir: base_dir.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &BufferStore {
        &self.store
    }

    /// Buffer one record, flushing its key immediately when the count
    /// threshold is reached.
    pub fn ingest(&self, record: TradeRecord) {
        let key = record.key();
        if self.store.append(key.clone(), record) {
            debug!(
                exchange = %key.exchange,
                symbol = %key.symbol,
                "buffer threshold reached"
            );
            self.flush(&key);
        }
    }

    /// Drain `key` and append the batch to its file. A write failure drops
    /// the batch.
    pub fn flush(&self, key: &BufferKey) {
        let mut files = self.files.lock().unwrap();
        let batch = self.store.drain(key);
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.write_batch(&mut files, key, &batch) {
            error!(
                exchange = %key.exchange,
                symbol = %key.symbol,
                dropped = batch.len(),
                error = %e,
                "flush failed, dropping batch"
            );
            // The cached handle may be mid-row; reopen on the next flush.
            files.remove(key);
        }
    }

    /// Flush every key the store has seen.
    pub fn flush_all(&self) {
        for key in self.store.keys() {
            self.flush(&key);
        }
    }

    /// Deterministic output path for a key: `<base>/<exchange>/<symbol>.csv`.
    pub fn path_for(&self, key: &BufferKey) -> PathBuf {
        self.base_dir
            .join(&key.exchange)
            .join(format!("{}.csv", key.symbol))
    }

    fn write_batch(
        &self,
        files: &mut HashMap<BufferKey, BufWriter<File>>,
        key: &BufferKey,
        batch: &[TradeRecord],
    ) -> Result<(), FlushError> {
        let writer = match files.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = self.path_for(key);
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                let fresh = file.metadata()?.len() == 0;
                let mut writer = BufWriter::new(file);
                if fresh {
                    writeln!(writer, "{CSV_HEADER}")?;
                }
                info!(path = %path.display(), "opened output file");
                entry.insert(writer)
            }
        };
        for record in batch {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                record.timestamp,
                record.exchange,
                record.symbol,
                record.price,
                record.amount,
                record.side
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Periodic timer that flushes every known key; bounds the loss window for
/// low-traffic symbols that never hit the count threshold. Runs one final
/// flush when the shutdown signal flips.
pub async fn run_flush_timer(
    engine: Arc<FlushEngine>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tick.tick() => engine.flush_all(),
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    engine.flush_all();
                    info!("flush timer stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DEFAULT_BUFFER_THRESHOLD;
    use crate::record::Side;
    use tempfile::TempDir;

    fn record(amount: f64) -> TradeRecord {
        TradeRecord {
            timestamp: 1700000000.123,
            exchange: "binance".to_string(),
            symbol: "BTCUSDT".to_string(),
            price: 42000.5,
            amount,
            side: Side::Buy,
        }
    }

    fn key() -> BufferKey {
        BufferKey::new("binance", "BTCUSDT")
    }

    #[test]
    fn test_writes_header_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let engine = FlushEngine::new(tmp.path(), BufferStore::new(DEFAULT_BUFFER_THRESHOLD));

        engine.ingest(record(1.0));
        engine.flush(&key());
        engine.ingest(record(2.0));
        engine.flush(&key());

        let content = fs::read_to_string(engine.path_for(&key())).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.iter().filter(|l| **l == CSV_HEADER).count(), 1);
    }

    #[test]
    fn test_row_format() {
        let tmp = TempDir::new().unwrap();
        let engine = FlushEngine::new(tmp.path(), BufferStore::new(DEFAULT_BUFFER_THRESHOLD));

        engine.ingest(record(0.25));
        engine.flush(&key());

        let content = fs::read_to_string(engine.path_for(&key())).unwrap();
        assert_eq!(
            content.lines().nth(1),
            Some("1700000000.123,binance,BTCUSDT,42000.5,0.25,buy")
        );
    }

    #[test]
    fn test_threshold_triggers_flush() {
        let tmp = TempDir::new().unwrap();
        let engine = FlushEngine::new(tmp.path(), BufferStore::new(3));

        engine.ingest(record(1.0));
        engine.ingest(record(2.0));
        assert!(!engine.path_for(&key()).exists());

        engine.ingest(record(3.0));
        let content = fs::read_to_string(engine.path_for(&key())).unwrap();
        assert_eq!(content.lines().count(), 4); // header + 3 rows
        assert_eq!(engine.store().pending(&key()), 0);

        // The next record buffers again instead of writing immediately.
        engine.ingest(record(4.0));
        assert_eq!(engine.store().pending(&key()), 1);
        let content = fs::read_to_string(engine.path_for(&key())).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_empty_flush_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let engine = FlushEngine::new(tmp.path(), BufferStore::new(DEFAULT_BUFFER_THRESHOLD));

        engine.flush(&key());
        assert!(!engine.path_for(&key()).exists());
    }

    #[test]
    fn test_header_respected_on_preexisting_file() {
        let tmp = TempDir::new().unwrap();
        let engine = FlushEngine::new(tmp.path(), BufferStore::new(DEFAULT_BUFFER_THRESHOLD));

        // Simulate a restart over a file from a previous run.
        let path = engine.path_for(&key());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("{CSV_HEADER}\n1,binance,BTCUSDT,1,1,buy\n")).unwrap();

        engine.ingest(record(2.0));
        engine.flush(&key());

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| **l == CSV_HEADER).count(), 1);
    }

    #[tokio::test]
    async fn test_timer_flushes_below_threshold() {
        let tmp = TempDir::new().unwrap();
        let engine = Arc::new(FlushEngine::new(
            tmp.path(),
            BufferStore::new(DEFAULT_BUFFER_THRESHOLD),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let timer = tokio::spawn(run_flush_timer(
            Arc::clone(&engine),
            Duration::from_millis(20),
            shutdown_rx,
        ));

        engine.ingest(record(1.0));
        engine.ingest(record(2.0));

        let path = engine.path_for(&key());
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while engine.store().pending(&key()) > 0 {
            assert!(std::time::Instant::now() < deadline, "timer never flushed");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(true).unwrap();
        timer.await.unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
