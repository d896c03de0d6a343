//! Reader supervision: one or more readers per subscribed queue, each on its own task

use consumer_config::ConsumerEnvironment;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::Session;

use super::client::MessageClientFactory;
use super::reader::{QueueReader, ReaderStats};
use crate::error::{ConsumerError, Result};
use crate::output::QueueListenerInfo;

/// Starts readers and stops them together.
///
/// Dropping the supervisor cancels its token.
pub struct ReaderSupervisor {
    cancel: CancellationToken,
    readers: Vec<Arc<QueueReader>>,
    handles: Vec<JoinHandle<()>>,
}

impl ReaderSupervisor {
    /// Readers stop when `cancel` (or [`shutdown`](Self::shutdown)) fires
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            readers: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Start `environment.readers_per_queue` readers on each listener.
    ///
    /// Every reader of every listener is constructed before any is spawned,
    /// so a setup error leaves the supervisor without new readers. Reader ids
    /// are `"<queue> <n>"`.
    pub fn start_queues(
        &mut self,
        listeners: &[Arc<QueueListenerInfo>],
        environment: &ConsumerEnvironment,
        session: Arc<Session>,
        clients: &dyn MessageClientFactory,
    ) -> Result<usize> {
        let mut readers = Vec::new();
        for listener in listeners {
            readers.extend(self.build_readers(listener, environment, &session, clients)?);
        }

        let started = readers.len();
        for reader in readers {
            let task_reader = Arc::clone(&reader);
            self.handles
                .push(tokio::spawn(async move { task_reader.run().await }));
            self.readers.push(reader);
        }

        for listener in listeners {
            info!(
                "Started {} reader(s) for queue {}",
                environment.readers_per_queue.max(1),
                listener.queue_name()
            );
        }
        Ok(started)
    }

    fn build_readers(
        &self,
        listener: &Arc<QueueListenerInfo>,
        environment: &ConsumerEnvironment,
        session: &Arc<Session>,
        clients: &dyn MessageClientFactory,
    ) -> Result<Vec<Arc<QueueReader>>> {
        (1..=environment.readers_per_queue.max(1))
            .map(|n| {
                QueueReader::new(
                    Arc::clone(listener),
                    environment,
                    Arc::clone(session),
                    format!("{} {}", listener.queue_name(), n),
                    clients,
                )
                .map(|reader| Arc::new(reader.with_cancellation(self.cancel.child_token())))
            })
            .collect()
    }

    pub fn readers(&self) -> &[Arc<QueueReader>] {
        &self.readers
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Per-reader counters keyed by reader id
    pub fn stats(&self) -> Vec<(String, ReaderStats)> {
        self.readers
            .iter()
            .map(|reader| (reader.reader_id().to_string(), reader.stats()))
            .collect()
    }

    /// Cancel every reader and wait for its task to end
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancel.cancel();

        let mut failed = Vec::new();
        for (reader, handle) in self.readers.iter().zip(self.handles.drain(..)) {
            if let Err(e) = handle.await {
                warn!("{}: reader task ended abnormally: {}", reader.reader_id(), e);
                failed.push(reader.reader_id().to_string());
            }
        }
        self.readers.clear();

        if failed.is_empty() {
            info!("All readers stopped");
            Ok(())
        } else {
            Err(ConsumerError::Shutdown(format!(
                "reader task(s) failed: {}",
                failed.join(", ")
            )))
        }
    }
}

impl Drop for ReaderSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
