//! Queue listener descriptors: which remote queue to read and where its events go

use consumer_config::{ConsumerEnvironment, QueueSubscription};
use std::collections::HashMap;
use std::time::Duration;
use types::{Context, ServiceType, Zone};

use super::local_queue::LocalConsumerQueue;

/// Routing key of a local consumer queue
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalQueueKey {
    pub zone_id: String,
    pub context_id: String,
    pub service_name: String,
    pub service_type: ServiceType,
}

impl LocalQueueKey {
    pub fn new(
        zone: &Zone,
        context: &Context,
        service_name: &str,
        service_type: ServiceType,
    ) -> Self {
        Self {
            zone_id: zone.id().to_string(),
            context_id: context.id().to_string(),
            service_name: service_name.to_string(),
            service_type,
        }
    }
}

impl std::fmt::Display for LocalQueueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.zone_id, self.context_id, self.service_name, self.service_type
        )
    }
}

/// Static subscription to one remote queue.
///
/// Built once; readers only ever read it.
#[derive(Debug, Clone)]
pub struct QueueListenerInfo {
    queue_name: String,
    message_uri: String,
    wait_time: Duration,
    local_queues: HashMap<LocalQueueKey, LocalConsumerQueue>,
}

impl QueueListenerInfo {
    pub fn new(
        queue_name: impl Into<String>,
        message_uri: impl Into<String>,
        wait_time: Duration,
    ) -> Self {
        Self {
            queue_name: queue_name.into(),
            message_uri: message_uri.into(),
            wait_time,
            local_queues: HashMap::new(),
        }
    }

    /// Route events for a tuple into `queue`; a later registration for the
    /// same tuple replaces the earlier one
    pub fn with_local_queue(
        mut self,
        zone: &Zone,
        context: &Context,
        service_name: &str,
        service_type: ServiceType,
        queue: LocalConsumerQueue,
    ) -> Self {
        self.local_queues.insert(
            LocalQueueKey::new(zone, context, service_name, service_type),
            queue,
        );
        self
    }

    /// Build from configuration, one local queue per binding
    pub fn from_config(
        subscription: &QueueSubscription,
        environment: &ConsumerEnvironment,
    ) -> Self {
        subscription.bindings.iter().fold(
            Self::new(
                subscription.name.as_str(),
                subscription.message_uri.as_str(),
                subscription.wait_time(),
            ),
            |listener, binding| {
                let zone = environment.zone_for(binding.zone.as_deref());
                let context = environment.context_for(binding.context.as_deref());
                let key = LocalQueueKey::new(
                    &zone,
                    &context,
                    &binding.service_name,
                    binding.service_type,
                );
                let queue = LocalConsumerQueue::new(
                    format!("{} {}", subscription.name, key),
                    environment.local_queue_capacity,
                );
                listener.with_local_queue(
                    &zone,
                    &context,
                    &binding.service_name,
                    binding.service_type,
                    queue,
                )
            },
        )
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn message_uri(&self) -> &str {
        &self.message_uri
    }

    /// Server-advertised wait time, zero when unknown
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    pub fn local_queue(
        &self,
        zone: &Zone,
        context: &Context,
        service_name: &str,
        service_type: ServiceType,
    ) -> Option<&LocalConsumerQueue> {
        self.local_queues
            .get(&LocalQueueKey::new(zone, context, service_name, service_type))
    }

    pub fn local_queues(&self) -> impl Iterator<Item = (&LocalQueueKey, &LocalConsumerQueue)> {
        self.local_queues.iter()
    }
}
