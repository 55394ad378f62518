use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::Record;

/// How often a blocked publish re-attempts while waiting for queue space.
const PUBLISH_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Monotonic end-of-production signal, written once by the harvester and
/// observed by the persister. Only ever transitions false to true.
#[derive(Debug, Clone)]
pub struct CompletionFlag(Arc<AtomicBool>);

impl CompletionFlag {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn mark_complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The queue stayed full past the publish deadline.
    Full,
    /// The consumer side was dropped.
    Closed,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Full => write!(f, "record queue full past publish deadline"),
            PublishError::Closed => write!(f, "record queue consumer is gone"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Producer half of the record queue. Held only by the harvester.
#[derive(Debug)]
pub struct RecordQueue {
    tx: SyncSender<Record>,
}

impl RecordQueue {
    /// Bounded blocking put. A full queue blocks the caller up to `timeout`;
    /// this is the pipeline's backpressure mechanism.
    pub fn publish(&self, record: Record, timeout: Duration) -> Result<(), PublishError> {
        let deadline = Instant::now() + timeout;
        let mut pending = record;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(record)) => {
                    if Instant::now() >= deadline {
                        return Err(PublishError::Full);
                    }
                    pending = record;
                    thread::sleep(PUBLISH_RETRY_INTERVAL);
                }
                Err(TrySendError::Disconnected(_)) => return Err(PublishError::Closed),
            }
        }
    }
}

/// Consumer half of the record queue. Held only by the persister.
#[derive(Debug)]
pub struct RecordDrain {
    rx: Receiver<Record>,
}

impl RecordDrain {
    /// Blocking receive with timeout. Returns `None` on timeout or when the
    /// producer side is gone.
    pub fn next_within(&self, timeout: Duration) -> Option<Record> {
        match self.rx.recv_timeout(timeout) {
            Ok(record) => Some(record),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking drain of everything currently queued, in enqueue order.
    pub fn drain_now(&self) -> Vec<Record> {
        let mut drained = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            drained.push(record);
        }
        drained
    }
}

/// Builds the single-producer/single-consumer pipeline context: a bounded
/// record queue split into its two ends, plus the shared completion flag.
/// Exclusive ownership of each half enforces the SPSC discipline at the type
/// level.
pub fn record_channel(capacity: usize) -> (RecordQueue, RecordDrain, CompletionFlag) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        RecordQueue { tx },
        RecordDrain { rx },
        CompletionFlag::new(),
    )
}
