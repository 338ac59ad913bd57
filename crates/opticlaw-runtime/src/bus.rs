//! Priority event bus with a single consumer.
//!
//! Events are ordered by priority rank, then by publish sequence, so equal
//! priority events are dispatched in the order they were published. The run
//! loop handles one event to completion before looking at the queue again.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use opticlaw_core::types::EventEnvelope;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

struct QueueItem {
    rank: u8,
    seq: u64,
    event: EventEnvelope,
}

impl QueueItem {
    fn key(&self) -> (u8, u64) {
        (self.rank, self.seq)
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    // BinaryHeap is a max-heap; the lowest (rank, seq) must come out first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Heap plus the sequence counter. Both live under one lock so a sequence
/// number is never visible to the consumer before every smaller one is.
#[derive(Default)]
struct Queue {
    heap: BinaryHeap<QueueItem>,
    next_seq: u64,
}

impl Queue {
    fn push(&mut self, event: EventEnvelope) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let rank = event.priority.rank();
        self.heap.push(QueueItem { rank, seq, event });
        seq
    }
}

struct Inner {
    queue: Mutex<Queue>,
    wake: Notify,
    stop: watch::Sender<bool>,
}

/// Cloneable handle to one shared queue.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Create an empty, running bus.
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(Queue::default()),
                wake: Notify::new(),
                stop,
            }),
        }
    }

    /// Enqueue `event` and wake the consumer. Never blocks on the consumer.
    pub fn publish(&self, event: EventEnvelope) {
        let event_id = event.event_id.clone();
        let priority = event.priority;
        let seq = self
            .inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        tracing::debug!(event_id = %event_id, priority = %priority, seq, "Event published");
        self.inner.wake.notify_one();
    }

    /// Publish `event` once `delay` has elapsed, without blocking the caller.
    pub fn schedule_once(&self, delay: Duration, event: EventEnvelope) -> JoinHandle<()> {
        let bus = self.clone();
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(event_id = %event.event_id, delay_ms, "Event scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.publish(event);
        })
    }

    /// Dispatch events to `handler` until [`stop`](Self::stop) is observed.
    ///
    /// The event in flight when stop is requested runs to completion; no
    /// further event is dispatched after that.
    pub async fn run<F, Fut>(&self, mut handler: F)
    where
        F: FnMut(EventEnvelope) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut stop_rx = self.inner.stop.subscribe();
        tracing::info!("Event bus running");

        loop {
            if *stop_rx.borrow() {
                break;
            }

            match self.pop() {
                Some(item) => {
                    tracing::debug!(
                        event_id = %item.event.event_id,
                        seq = item.seq,
                        "Dispatching event"
                    );
                    handler(item.event).await;
                }
                None => {
                    tokio::select! {
                        _ = self.inner.wake.notified() => {}
                        _ = stop_rx.changed() => {}
                    }
                }
            }
        }

        tracing::info!(pending = self.len(), "Event bus stopped");
    }

    /// Request the run loop to exit. Idempotent; safe before `run` starts.
    pub fn stop(&self) {
        self.inner.stop.send_replace(true);
    }

    /// Whether stop has been requested. Once true, stays true.
    pub fn is_stopped(&self) -> bool {
        *self.inner.stop.borrow()
    }

    /// Events waiting to be dispatched.
    pub fn len(&self) -> usize {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .heap
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pop(&self) -> Option<QueueItem> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .heap
            .pop()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
