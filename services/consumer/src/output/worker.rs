//! Application-side consumers draining a local queue

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use types::EventInfo;

use super::local_queue::LocalConsumerQueue;
use crate::error::{ConsumerError, Result};

/// Application code receiving events.
///
/// Each popped event reaches exactly one handler call. Duplicates can still
/// arrive from the remote queue after a restart, so handlers must tolerate
/// seeing the same message id twice.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_event(&self, event: EventInfo);
}

/// Pool of tasks popping from one local queue
pub struct ConsumerWorkers {
    queue_name: String,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl ConsumerWorkers {
    /// Spawn `workers` tasks (at least one) on the current runtime
    pub fn spawn(
        queue: LocalConsumerQueue,
        handler: Arc<dyn EventHandler>,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        let queue_name = queue.name().to_string();
        let handles = (1..=workers.max(1))
            .map(|worker| {
                let queue = queue.clone();
                let handler = Arc::clone(&handler);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    debug!(queue = %queue.name(), worker, "Consumer worker started");
                    while let Some(event) = queue.pop_cancellable(&cancel).await {
                        handler.on_event(event).await;
                    }
                    debug!(queue = %queue.name(), worker, "Consumer worker stopped");
                })
            })
            .collect();

        info!("Started {} consumer worker(s) for {}", workers.max(1), queue_name);
        Self {
            queue_name,
            cancel,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel all workers and wait for them to finish their current event
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        for handle in self.handles {
            handle.await.map_err(|e| {
                ConsumerError::Shutdown(format!("worker for {} failed: {}", self.queue_name, e))
            })?;
        }
        Ok(())
    }
}
