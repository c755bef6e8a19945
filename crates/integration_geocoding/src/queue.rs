//! Serialized, paced request queue
//!
//! All lookups go through one FIFO drained by a single consumer task, so at
//! most one request is in flight and consecutive requests start at least
//! `min_interval` apart (Nominatim allows one request per second).
//!
//! The consumer is spawned on demand: the first enqueue into an idle queue
//! starts it, and it exits once the FIFO is empty. The `draining` flag is
//! flipped under the same lock that guards the FIFO, so an enqueue can never
//! observe "idle" while a drain is still about to pick up its task.
//!
//! Each lookup runs in its own task, so a panicking lookup is reported to its
//! caller as a `TransportFailure` and the consumer moves on. If the consumer
//! itself is dropped early (its runtime shut down), a drop guard marks the
//! queue idle and fails whatever was still waiting, so the next enqueue
//! starts a fresh consumer.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{Address, GeocodeResult};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::client::GeocodeLookup;
use crate::clock::Clock;
use crate::error::GeocodingError;

type Outcome = Result<GeocodeResult, GeocodingError>;

/// A pending lookup and the handle its caller is waiting on
struct QueueTask {
    address: Address,
    reply: oneshot::Sender<Outcome>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueueTask>,
    draining: bool,
    last_request: Option<Instant>,
}

struct Inner {
    lookup: Arc<dyn GeocodeLookup>,
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    state: Mutex<QueueState>,
}

/// FIFO of geocode requests serviced one at a time with minimum spacing
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct RateLimitedQueue {
    inner: Arc<Inner>,
}

impl fmt::Debug for RateLimitedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RateLimitedQueue")
            .field("min_interval", &self.inner.min_interval)
            .field("pending", &state.pending.len())
            .field("draining", &state.draining)
            .finish_non_exhaustive()
    }
}

impl RateLimitedQueue {
    pub fn new(
        lookup: Arc<dyn GeocodeLookup>,
        clock: Arc<dyn Clock>,
        min_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                lookup,
                clock,
                min_interval,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }

    /// Clock used for pacing
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    /// Number of tasks waiting to be dequeued
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether a consumer is currently draining the FIFO
    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }

    /// Queue a lookup and wait for its outcome
    ///
    /// Must be called from within a tokio runtime; the consumer is spawned on it.
    ///
    /// # Errors
    ///
    /// Returns whatever the lookup returned for this address, or a
    /// `TransportFailure` if the consumer went away without answering.
    pub async fn enqueue(&self, address: Address) -> Result<GeocodeResult, GeocodingError> {
        let (reply, outcome) = oneshot::channel();

        let start_consumer = {
            let mut state = self.inner.state.lock();
            state.pending.push_back(QueueTask { address, reply });
            trace!(pending = state.pending.len(), "Geocode request queued");
            !std::mem::replace(&mut state.draining, true)
        };

        if start_consumer {
            debug!("Starting geocode queue consumer");
            tokio::spawn(Arc::clone(&self.inner).drain());
        }

        outcome.await.map_err(|_| {
            GeocodingError::transport("geocode queue dropped the request without a result")
        })?
    }
}

impl Inner {
    fn next_task(&self) -> Option<QueueTask> {
        let mut state = self.state.lock();
        let task = state.pending.pop_front();
        if task.is_none() {
            state.draining = false;
        }
        task
    }

    /// Time still to wait before the next request may start
    fn remaining_wait(&self, now: Instant) -> Option<Duration> {
        let last = self.state.lock().last_request?;
        let wait = self
            .min_interval
            .saturating_sub(now.saturating_duration_since(last));
        (!wait.is_zero()).then_some(wait)
    }

    /// Run one lookup in its own task so a panic cannot take the consumer down
    async fn run_lookup(&self, address: &Address) -> Outcome {
        let lookup = Arc::clone(&self.lookup);
        let address = address.clone();
        match tokio::spawn(async move { lookup.lookup(&address).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Geocode lookup task failed");
                Err(GeocodingError::transport(format!(
                    "geocode lookup did not complete: {e}"
                )))
            },
        }
    }

    async fn drain(self: Arc<Self>) {
        let mut guard = DrainGuard {
            inner: &self,
            finished: false,
        };

        loop {
            let Some(task) = self.next_task() else {
                guard.finished = true;
                break;
            };

            if let Some(wait) = self.remaining_wait(self.clock.now()) {
                debug!(?wait, "Rate limiting geocoding request");
                self.clock.sleep(wait).await;
            }
            self.state.lock().last_request = Some(self.clock.now());

            let outcome = self.run_lookup(&task.address).await;
            if task.reply.send(outcome).is_err() {
                debug!(address = %task.address, "Geocode caller went away before its result arrived");
            }
        }
        debug!("Geocode queue drained");
    }
}

/// Resets the queue to idle if the consumer stops before the FIFO is empty
struct DrainGuard<'a> {
    inner: &'a Inner,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let abandoned = {
            let mut state = self.inner.state.lock();
            state.draining = false;
            std::mem::take(&mut state.pending)
        };
        // Dropping the reply senders fails the waiting callers.
        if !abandoned.is_empty() {
            warn!(
                abandoned = abandoned.len(),
                "Geocode queue consumer stopped early, failing queued requests"
            );
        }
    }
}
