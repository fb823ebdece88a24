//! # Observation Sinks and Dispatcher
//!
//! The poller hands each batch of observations to an [`ObservationSink`].
//! What happens next (entity updates, logging, forwarding) belongs to the
//! consumer.
//!
//! ## Provided sinks:
//!
//! 1.  **Closures**: any `FnMut(Vec<Observation>)`.
//! 2.  **Channels**: a `tokio::sync::mpsc::UnboundedSender<Vec<Observation>>`.
//! 3.  **`Dispatcher`**: a fan-out sink. Each batch is wrapped once in an
//!     `Arc<ObservationFrame>` and every subscriber receives a pointer to the
//!     same frame, so adding subscribers does not copy observations.
//!     Subscribers whose receiver has been dropped are removed on the next
//!     broadcast.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::core::observation::Observation;

/// A downstream consumer of observation batches.
pub trait ObservationSink {
    /// Receives the observations of one successful poll.
    fn deliver(&mut self, batch: Vec<Observation>);
}

impl<F> ObservationSink for F
where
    F: FnMut(Vec<Observation>),
{
    fn deliver(&mut self, batch: Vec<Observation>) {
        self(batch)
    }
}

impl ObservationSink for mpsc::UnboundedSender<Vec<Observation>> {
    fn deliver(&mut self, batch: Vec<Observation>) {
        if self.send(batch).is_err() {
            log::warn!("Observation receiver dropped; batch discarded.");
        }
    }
}

/// # Observation Frame
///
/// A batch as seen by `Dispatcher` subscribers.
#[derive(Debug, Clone)]
pub struct ObservationFrame {
    /// Monotonic batch number, starting at 1.
    pub seq: u64,
    /// When the dispatcher received the batch.
    pub ts_dispatched: Instant,
    /// The observations of one poll.
    pub observations: Vec<Observation>,
}

/// An internal handle on one subscriber.
struct ClientHandle {
    /// Subscriber name, used in logs and for removal.
    id: String,
    /// Sending half of the subscriber's channel.
    sender: mpsc::UnboundedSender<Arc<ObservationFrame>>,
}

/// # Dispatcher
///
/// Fans each observation batch out to all registered subscribers.
#[derive(Default)]
pub struct Dispatcher {
    /// Currently registered subscribers.
    clients: Mutex<Vec<ClientHandle>>,
    /// Sequence number of the last broadcast frame.
    seq: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, Vec<ClientHandle>> {
        // Handles stay consistent even if a holder panicked.
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// # Add Client
    ///
    /// Registers a subscriber and returns the receiver it should read frames from.
    pub fn add_client(&self, id: &str) -> mpsc::UnboundedReceiver<Arc<ObservationFrame>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients().push(ClientHandle {
            id: id.to_string(),
            sender: tx,
        });
        log::info!("Client '{}' registered with dispatcher", id);
        rx
    }

    /// Removes a subscriber by id.
    pub fn remove_client(&self, id: &str) {
        self.clients().retain(|c| c.id != id);
        log::info!("Client '{}' explicitly removed.", id);
    }

    /// Number of registered subscribers.
    pub fn client_count(&self) -> usize {
        self.clients().len()
    }

    /// # Broadcast
    ///
    /// Wraps `observations` in a single shared frame and sends it to every
    /// subscriber, dropping subscribers that have disconnected.
    ///
    /// Returns the number of subscribers that received the frame.
    pub fn broadcast(&self, observations: Vec<Observation>) -> usize {
        let frame = Arc::new(ObservationFrame {
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            ts_dispatched: Instant::now(),
            observations,
        });

        let mut clients = self.clients();
        clients.retain(|client| match client.sender.send(Arc::clone(&frame)) {
            Ok(()) => true,
            Err(_) => {
                log::info!("Client '{}' disconnected. Removing from dispatcher.", client.id);
                false
            }
        });
        clients.len()
    }
}

impl ObservationSink for Dispatcher {
    fn deliver(&mut self, batch: Vec<Observation>) {
        self.broadcast(batch);
    }
}
