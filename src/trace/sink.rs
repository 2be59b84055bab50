use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::channel::EventSink;
use super::event::TraceEvent;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize trace event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write trace event: {0}")]
    Io(#[from] std::io::Error),
}

/// Poison-tolerant lock: a sink must keep absorbing events even after a
/// panic elsewhere poisoned its mutex.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Discards every event. The stand-in for an uninstrumented run.
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: TraceEvent) {}
}

/// In-memory buffer, mainly for tests and local inspection.
#[derive(Default)]
pub struct CaptureSink {
    buffer: Mutex<Vec<TraceEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        lock_unpoisoned(&self.buffer).clone()
    }

    pub fn take(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *lock_unpoisoned(&self.buffer))
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.buffer).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CaptureSink {
    fn record(&self, event: TraceEvent) {
        lock_unpoisoned(&self.buffer).push(event);
    }
}

/// Writes one JSON object per line, the transport format the external
/// debugger process tails. Write failures are logged and swallowed.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn try_record(&self, event: &TraceEvent) -> Result<(), SinkError> {
        let line = serde_json::to_string(event)?;
        let mut writer = lock_unpoisoned(&self.writer);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn record(&self, event: TraceEvent) {
        if let Err(e) = self.try_record(&event) {
            warn!("trace sink write failed: {}", e);
        }
    }
}

/// Forwards events into a tokio channel for an async consumer (the demo
/// driver, or a socket pump). Never blocks the emitting thread: a full or
/// closed channel drops the event.
pub struct ChannelSink {
    tx: mpsc::Sender<TraceEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<TraceEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn record(&self, event: TraceEvent) {
        if self.tx.try_send(event).is_err() {
            debug!("trace channel full or closed, event dropped");
        }
    }
}
