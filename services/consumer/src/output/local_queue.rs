//! Local Consumer Queue - bounded hand-off between readers and application consumers
//!
//! One queue per (zone, context, service name, service type) tuple. Readers
//! push, application workers pop. A full queue suspends the pushing reader,
//! which is the only backpressure path from the application back to the
//! remote poll loop. Events are never dropped because a queue is full.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use types::EventInfo;

use crate::error::{ConsumerError, Result};

/// Result of a push that may be interrupted by shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Cancelled while waiting for space; the event was not queued
    Cancelled,
}

/// Bounded FIFO of events for one local service.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct LocalConsumerQueue {
    name: Arc<str>,
    sender: mpsc::Sender<EventInfo>,
    // Shared so several workers can pop; the lock is held across a pending recv
    receiver: Arc<Mutex<mpsc::Receiver<EventInfo>>>,
}

impl LocalConsumerQueue {
    /// Create a queue holding at most `capacity` events (minimum 1)
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            name: Arc::from(name.into()),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Events currently queued
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue an event, waiting for space while the queue is full
    pub async fn push(&self, event: EventInfo) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| ConsumerError::Shutdown(format!("local queue {} closed", self.name)))
    }

    /// [`push`](Self::push) that gives up when `cancel` fires
    pub async fn push_cancellable(
        &self,
        event: EventInfo,
        cancel: &CancellationToken,
    ) -> Result<PushOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(queue = %self.name, "Push abandoned on shutdown");
                Ok(PushOutcome::Cancelled)
            }
            sent = self.push(event) => sent.map(|_| PushOutcome::Delivered),
        }
    }

    /// Queue without waiting; hands the event back if the queue is full
    pub fn try_push(&self, event: EventInfo) -> std::result::Result<(), EventInfo> {
        self.sender.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(event) | mpsc::error::TrySendError::Closed(event) => {
                event
            }
        })
    }

    /// Next event in arrival order, waiting while the queue is empty
    pub async fn pop(&self) -> Option<EventInfo> {
        self.receiver.lock().await.recv().await
    }

    /// [`pop`](Self::pop) that returns `None` once `cancel` fires
    pub async fn pop_cancellable(&self, cancel: &CancellationToken) -> Option<EventInfo> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            event = self.pop() => event,
        }
    }

    pub fn try_pop(&self) -> Option<EventInfo> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Blocking pop for consumers on plain threads.
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_pop(&self) -> Option<EventInfo> {
        self.receiver.blocking_lock().blocking_recv()
    }
}

impl std::fmt::Debug for LocalConsumerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConsumerQueue")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
