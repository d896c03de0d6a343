//! Queue Reader - the polling loop for one remote queue subscription
//!
//! Each iteration fetches one message, passing back the id of the message
//! fetched last time so the remote queue can drop it (acknowledgement rides
//! on the next fetch). Then:
//!
//! - no content or an error response: forget the id and wait
//! - transport failure: log and wait, id untouched
//! - a message: classify, dispatch to the local queue, poll again at once
//!
//! The wait is `max(server wait time, configured poll frequency)`. Every
//! suspension point (fetch, wait, push into a full local queue) also listens
//! to the reader's cancellation token.

use consumer_config::ConsumerEnvironment;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use types::{EventInfo, EventMetadata, Session};
use url::Url;

use super::classifier::{Classification, ClassifiedEvent, MessageClassifier};
use super::client::{MessageClient, MessageClientFactory, Response};
use crate::error::{ConsumerError, Result};
use crate::output::{PushOutcome, QueueListenerInfo};

/// What a single poll iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Queue was empty
    NoMessage,
    /// Response carried an error payload or was an ERROR message
    ErrorResponse,
    /// The fetch itself failed
    TransportFailure,
    /// Event handed to its local queue
    Delivered,
    /// Event had no local consumer
    Discarded,
    /// Headers could not be decoded; message dropped
    DecodeFailed,
    /// Delayed RESPONSE message, ignored
    DelayedResponse,
    /// Shutdown interrupted the iteration
    Cancelled,
}

impl PollOutcome {
    /// Outcomes after which the reader waits before polling again
    pub fn waits(&self) -> bool {
        matches!(
            self,
            PollOutcome::NoMessage | PollOutcome::ErrorResponse | PollOutcome::TransportFailure
        )
    }
}

/// Snapshot of a reader's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Calls made to the remote queue
    pub polls: u64,
    /// Responses that carried a message
    pub messages_received: u64,
    /// Events pushed into a local queue
    pub events_delivered: u64,
    /// Events with no registered local queue
    pub events_discarded: u64,
    /// Messages dropped because a header could not be decoded
    pub decode_failures: u64,
    /// Responses carrying an error payload or an ERROR message type
    pub error_responses: u64,
    /// Calls that failed in the transport
    pub transport_failures: u64,
}

#[derive(Debug, Default)]
struct ReaderCounters {
    polls: AtomicU64,
    messages_received: AtomicU64,
    events_delivered: AtomicU64,
    events_discarded: AtomicU64,
    decode_failures: AtomicU64,
    error_responses: AtomicU64,
    transport_failures: AtomicU64,
}

impl ReaderCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ReaderStats {
        ReaderStats {
            polls: self.polls.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            error_responses: self.error_responses.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// Reader for one remote queue
pub struct QueueReader {
    reader_id: String,
    listener: Arc<QueueListenerInfo>,
    session: Arc<Session>,
    client: Arc<dyn MessageClient>,
    classifier: MessageClassifier,
    wait_interval: Duration,
    // id of the last fetched message, acknowledged by the next fetch
    last_message_id: Mutex<Option<String>>,
    counters: ReaderCounters,
    cancel: CancellationToken,
}

impl QueueReader {
    /// Build a reader; fails if the queue URI is invalid or no client can be created
    pub fn new(
        listener: Arc<QueueListenerInfo>,
        environment: &ConsumerEnvironment,
        session: Arc<Session>,
        reader_id: impl Into<String>,
        clients: &dyn MessageClientFactory,
    ) -> Result<Self> {
        let reader_id = reader_id.into();
        let queue = listener.queue_name().to_string();

        let uri = Url::parse(listener.message_uri()).map_err(|e| {
            ConsumerError::setup(
                queue.as_str(),
                format!("invalid message URI '{}': {}", listener.message_uri(), e),
            )
        })?;
        let client = clients.create(&uri, &session).map_err(|e| match e {
            ConsumerError::Setup { .. } => e,
            other => ConsumerError::setup(queue.as_str(), other.to_string()),
        })?;

        let wait_interval = listener.wait_time().max(environment.poll_frequency());
        debug!(
            "{}: reader for queue {} created, wait interval {:?}",
            reader_id, queue, wait_interval
        );

        Ok(Self {
            reader_id,
            classifier: MessageClassifier::new(&session),
            listener,
            session,
            client,
            wait_interval,
            last_message_id: Mutex::new(None),
            counters: ReaderCounters::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Use `cancel` (typically a supervisor's child token) to stop this reader
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn reader_id(&self) -> &str {
        &self.reader_id
    }

    pub fn queue_name(&self) -> &str {
        self.listener.queue_name()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn wait_interval(&self) -> Duration {
        self.wait_interval
    }

    /// Id that the next fetch will acknowledge
    pub fn last_message_id(&self) -> Option<String> {
        self.last_message_id.lock().clone()
    }

    pub fn stats(&self) -> ReaderStats {
        self.counters.snapshot()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the reader at its next suspension point
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("{}: shutdown requested", self.reader_id);
        }
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Poll until shut down. Failures inside an iteration never end the loop.
    pub async fn run(&self) {
        info!(
            "{}: reading queue {} at {}",
            self.reader_id,
            self.listener.queue_name(),
            self.listener.message_uri()
        );

        while !self.cancel.is_cancelled() {
            let outcome = self.poll_once().await;
            if outcome == PollOutcome::Cancelled {
                break;
            }

            if outcome.waits() {
                debug!("{}: next poll in {:?}", self.reader_id, self.wait_interval);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    _ = sleep(self.wait_interval) => {}
                }
            }
        }

        info!("{}: stopped reading queue {}", self.reader_id, self.listener.queue_name());
    }

    /// One fetch/classify/dispatch step, without the wait
    pub async fn poll_once(&self) -> PollOutcome {
        let cursor = self.last_message_id.lock().clone();

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return PollOutcome::Cancelled,
            fetched = self.client.get_message(cursor.as_deref(), &self.reader_id) => fetched,
        };
        ReaderCounters::bump(&self.counters.polls);

        let response = match fetched {
            Ok(response) => response,
            Err(e) => {
                ReaderCounters::bump(&self.counters.transport_failures);
                warn!(
                    "{}: failed to fetch from queue {}: {}",
                    self.reader_id,
                    self.listener.queue_name(),
                    e
                );
                return PollOutcome::TransportFailure;
            }
        };

        *self.last_message_id.lock() = response.message_id().map(str::to_string);

        if response.is_no_content() {
            self.clear_cursor();
            debug!("{}: no messages on queue {}", self.reader_id, self.listener.queue_name());
            return PollOutcome::NoMessage;
        }

        if let Some(details) = &response.error {
            self.clear_cursor();
            ReaderCounters::bump(&self.counters.error_responses);
            error!(
                "{}: error response from queue {}: {} {}{}",
                self.reader_id,
                self.listener.queue_name(),
                details.code,
                details.message,
                details
                    .description
                    .as_deref()
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default()
            );
            return PollOutcome::ErrorResponse;
        }

        ReaderCounters::bump(&self.counters.messages_received);
        self.process_message(response).await
    }

    fn clear_cursor(&self) {
        *self.last_message_id.lock() = None;
    }

    async fn process_message(&self, response: Response) -> PollOutcome {
        match self.classifier.classify(&response.headers) {
            Err(e) => {
                ReaderCounters::bump(&self.counters.decode_failures);
                error!(
                    "{}: dropping message {} from queue {}: {}",
                    self.reader_id,
                    response.message_id().unwrap_or("<no id>"),
                    self.listener.queue_name(),
                    e
                );
                PollOutcome::DecodeFailed
            }
            Ok(Classification::Error) => {
                self.clear_cursor();
                ReaderCounters::bump(&self.counters.error_responses);
                error!(
                    "{}: ERROR message on queue {}",
                    self.reader_id,
                    self.listener.queue_name()
                );
                PollOutcome::ErrorResponse
            }
            Ok(Classification::DelayedResponse) => {
                info!(
                    "{}: delayed responses are not supported, message {} ignored",
                    self.reader_id,
                    response.message_id().unwrap_or("<no id>")
                );
                PollOutcome::DelayedResponse
            }
            Ok(Classification::Event(event)) => self.dispatch(event, response).await,
        }
    }

    async fn dispatch(&self, event: ClassifiedEvent, response: Response) -> PollOutcome {
        let queue = event.service_name.as_deref().and_then(|service_name| {
            self.listener
                .local_queue(&event.zone, &event.context, service_name, event.service_type)
        });

        let Some(queue) = queue else {
            ReaderCounters::bump(&self.counters.events_discarded);
            info!(
                "{}: no local consumer for {} {} in zone {} context {}, event discarded",
                self.reader_id,
                event.service_type,
                event.service_name.as_deref().unwrap_or("<unnamed>"),
                event.zone,
                event.context
            );
            return PollOutcome::Discarded;
        };

        let message_id = response.message_id().map(str::to_string);
        let info = EventInfo {
            payload: response.data,
            media_type: response.media_type,
            event_action: event.action,
            update_type: event.update_type,
            zone: event.zone,
            context: event.context,
            metadata: EventMetadata::from_headers(response.headers),
            message_id,
            reader_id: self.reader_id.clone(),
        };

        match queue.push_cancellable(info, &self.cancel).await {
            Ok(PushOutcome::Delivered) => {
                ReaderCounters::bump(&self.counters.events_delivered);
                debug!("{}: event delivered to {}", self.reader_id, queue.name());
                PollOutcome::Delivered
            }
            Ok(PushOutcome::Cancelled) => PollOutcome::Cancelled,
            Err(e) => {
                ReaderCounters::bump(&self.counters.events_discarded);
                warn!("{}: {}", self.reader_id, e);
                PollOutcome::Discarded
            }
        }
    }
}

impl std::fmt::Debug for QueueReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueReader")
            .field("reader_id", &self.reader_id)
            .field("queue", &self.listener.queue_name())
            .field("wait_interval", &self.wait_interval)
            .field("last_message_id", &self.last_message_id())
            .finish()
    }
}
