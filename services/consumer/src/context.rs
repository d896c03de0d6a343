//! Consumer context: the one object an application builds to run the consumer
//!
//! Owns the configuration, the environment manager, the queue listeners and
//! the reader supervisor. Nothing here is global; two contexts in one process
//! are fully independent.

use consumer_config::ConsumerEnvironment;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::{AccessRight, AccessType, Context, ServiceType, Session, Zone};

use crate::environment::{EnvironmentManager, EnvironmentManagerKind, SessionProvisioner};
use crate::error::{ConsumerError, Result};
use crate::input::{MessageClientFactory, ReaderStats, ReaderSupervisor};
use crate::output::{ConsumerWorkers, EventHandler, LocalConsumerQueue, QueueListenerInfo};

pub struct ConsumerContext {
    environment: Arc<ConsumerEnvironment>,
    manager: EnvironmentManagerKind,
    clients: Arc<dyn MessageClientFactory>,
    listeners: Vec<Arc<QueueListenerInfo>>,
    supervisor: ReaderSupervisor,
    cancel: CancellationToken,
}

impl ConsumerContext {
    /// Validate configuration, pick the environment manager and build the
    /// queue listeners. Nothing runs until [`start`](Self::start).
    pub fn new(
        environment: ConsumerEnvironment,
        clients: Arc<dyn MessageClientFactory>,
        provisioner: Option<Arc<dyn SessionProvisioner>>,
    ) -> Result<Self> {
        environment.validate().map_err(ConsumerError::Configuration)?;
        let environment = Arc::new(environment);

        let manager =
            EnvironmentManagerKind::from_environment(Arc::clone(&environment), provisioner)?;
        let listeners = environment
            .queues
            .iter()
            .map(|queue| Arc::new(QueueListenerInfo::from_config(queue, &environment)))
            .collect();

        let cancel = CancellationToken::new();
        Ok(Self {
            supervisor: ReaderSupervisor::new(cancel.child_token()),
            environment,
            manager,
            clients,
            listeners,
            cancel,
        })
    }

    pub fn environment(&self) -> &ConsumerEnvironment {
        &self.environment
    }

    pub fn environment_manager(&self) -> &EnvironmentManagerKind {
        &self.manager
    }

    pub fn listeners(&self) -> &[Arc<QueueListenerInfo>] {
        &self.listeners
    }

    /// Local queue an application consumer should drain
    pub fn local_queue(
        &self,
        queue_name: &str,
        zone: &Zone,
        context: &Context,
        service_name: &str,
        service_type: ServiceType,
    ) -> Option<LocalConsumerQueue> {
        self.listeners
            .iter()
            .find(|listener| listener.queue_name() == queue_name)?
            .local_queue(zone, context, service_name, service_type)
            .cloned()
    }

    /// Establish the session and start readers on every configured queue
    pub async fn start(&mut self) -> Result<Arc<Session>> {
        let session = self.manager.start().await?;
        if self.supervisor.reader_count() > 0 {
            warn!(
                "Consumer {} already started, keeping its {} reader(s)",
                self.environment.adapter_name,
                self.supervisor.reader_count()
            );
            return Ok(session);
        }
        self.check_subscriptions(&session);

        self.supervisor.start_queues(
            &self.listeners,
            &self.environment,
            Arc::clone(&session),
            self.clients.as_ref(),
        )?;

        info!(
            "Consumer {} started: {} queue(s), {} reader(s)",
            self.environment.adapter_name,
            self.listeners.len(),
            self.supervisor.reader_count()
        );
        Ok(session)
    }

    /// Spawn the configured number of workers for one local queue
    pub fn spawn_workers(
        &self,
        queue: LocalConsumerQueue,
        handler: Arc<dyn EventHandler>,
    ) -> ConsumerWorkers {
        ConsumerWorkers::spawn(
            queue,
            handler,
            self.environment.consumer_workers,
            self.cancel.child_token(),
        )
    }

    pub fn reader_stats(&self) -> Vec<(String, ReaderStats)> {
        self.supervisor.stats()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop readers, then workers spawned through this context, then release the session
    pub async fn shutdown(&mut self) -> Result<()> {
        let readers = self.supervisor.shutdown().await;
        self.cancel.cancel();
        self.manager.shutdown().await?;
        readers
    }

    // A subscription the session has no SUBSCRIBE grant for still runs; the
    // broker decides what it delivers.
    fn check_subscriptions(&self, session: &Session) {
        for listener in &self.listeners {
            for (key, _) in listener.local_queues() {
                let zone = self.environment.zone_for(Some(key.zone_id.as_str()));
                let context = self.environment.context_for(Some(key.context_id.as_str()));
                if !session.has_access(
                    AccessRight::Subscribe,
                    AccessType::Approved,
                    &key.service_name,
                    Some(&zone),
                    Some(&context),
                ) {
                    warn!(
                        "Session for {} has no approved SUBSCRIBE right on {}",
                        session.adapter_name, key
                    );
                }
            }
        }
    }
}
