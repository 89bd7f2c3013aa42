//! Feed supervisor: one long-lived connection per exchange feed.
//!
//! Lifecycle: connect → send subscriptions → stream frames, with an
//! in-loop keepalive timer. Any transport failure drops back to
//! connecting after a fixed delay; only the shutdown signal stops the
//! loop for good.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use url::Url;

use crate::decode::{decode_frame, RawFrame};
use crate::error::TransportError;
use crate::feed::FeedConfig;
use crate::flush::FlushEngine;

/// Fixed reconnect/keepalive timing for one feed connection.
///
/// The reconnect delay is deliberately flat: no exponential growth, no
/// jitter, unbounded retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub reconnect_delay: Duration,
    pub keepalive_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// Owns one exchange feed connection for the life of the process.
/// Supervisors share nothing with each other except the flush engine.
pub struct FeedSupervisor {
    feed: FeedConfig,
    engine: Arc<FlushEngine>,
    policy: RetryPolicy,
}

impl FeedSupervisor {
    pub fn new(feed: FeedConfig, engine: Arc<FlushEngine>, policy: RetryPolicy) -> Self {
        Self {
            feed,
            engine,
            policy,
        }
    }

    /// Run until the shutdown signal flips. Connection failures are never
    /// fatal; the supervisor waits out the reconnect delay and tries again.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.run_connection(&mut shutdown).await {
                Ok(()) => {
                    info!(feed = self.feed.name, "feed supervisor stopped");
                    return;
                }
                Err(e) => {
                    warn!(
                        feed = self.feed.name,
                        error = %e,
                        delay = ?self.policy.reconnect_delay,
                        "connection lost, reconnecting after delay"
                    );
                }
            }

            tokio::select! {
                _ = sleep(self.policy.reconnect_delay) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(feed = self.feed.name, "feed supervisor stopped");
                        return;
                    }
                }
            }
        }
    }

    /// One connection lifetime. Ok(()) means shutdown was requested; any
    /// Err sends the supervisor back to connecting.
    async fn run_connection(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), TransportError> {
        let url = Url::parse(&self.feed.url)
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (ws, response) = connect_async(url.as_str()).await?;
        info!(
            feed = self.feed.name,
            url = %self.feed.url,
            status = ?response.status(),
            "connected"
        );

        let (mut sink, mut stream) = ws.split();

        for payload in &self.feed.subscribe {
            sink.send(Message::Text(payload.to_string())).await?;
        }
        info!(
            feed = self.feed.name,
            subscriptions = self.feed.subscribe.len(),
            "subscriptions sent"
        );

        let mut keepalive = interval(self.policy.keepalive_interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; swallow it so keepalives
        // start one full interval after connect.
        keepalive.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
                _ = keepalive.tick() => {
                    if let Some(payload) = &self.feed.keepalive {
                        sink.send(Message::Text(payload.to_string())).await?;
                    }
                    sink.send(Message::Ping(Vec::new())).await?;
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(RawFrame::Text(&text));
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            self.handle_frame(RawFrame::Binary(&bytes));
                        }
                        Some(Ok(Message::Ping(data))) => {
                            sink.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(feed = self.feed.name, frame = ?frame, "server closed connection");
                            return Err(TransportError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(TransportError::ConnectionClosed),
                    }
                }
            }
        }
    }

    /// Decode one frame and buffer whatever trades it normalizes to.
    /// Undecodable frames are discarded; the stream keeps going.
    fn handle_frame(&self, frame: RawFrame<'_>) {
        let msg = match decode_frame(frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(feed = self.feed.name, error = %e, "discarding undecodable frame");
                return;
            }
        };
        for record in self.feed.adapter.normalize(&msg) {
            self.engine.ingest(record);
        }
    }
}
