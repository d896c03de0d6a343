//! Consumer Environment Configuration
//!
//! Loads the consumer's view of its SIF3 environment: adapter identity, how the
//! environment is established, polling cadence, local queue sizing, the
//! services the adapter is entitled to and the remote queues it reads.
//!
//! Values come from a TOML file, then `SIF3_`-prefixed environment variables
//! override them (`SIF3_POLL_FREQUENCY_SECS=30`).

use anyhow::{Context as _, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use types::{
    AccessRight, AccessType, Context, ServiceInfo, ServiceRights, ServiceType, Zone,
    DEFAULT_CONTEXT_NAME,
};

use crate::service::{consumer, env};

/// How the environment session is established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvironmentType {
    /// Consumer talks straight to a provider; the session is built from local config
    #[default]
    Direct,
    /// Consumer goes through a broker that provisions the session
    Brokered,
}

/// Top-level consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerEnvironment {
    /// Name the adapter registers under
    pub adapter_name: String,

    /// How the session is obtained
    #[serde(default)]
    pub environment_type: EnvironmentType,

    /// Id of the session default zone
    pub default_zone: String,

    /// Lower bound on the wait between unsuccessful polls
    #[serde(default = "default_poll_frequency_secs")]
    pub poll_frequency_secs: u64,

    /// Capacity of every local consumer queue
    #[serde(default = "default_local_queue_capacity")]
    pub local_queue_capacity: usize,

    /// Application workers per local queue
    #[serde(default = "default_consumer_workers")]
    pub consumer_workers: usize,

    /// Concurrent readers per remote queue
    #[serde(default = "default_readers_per_queue")]
    pub readers_per_queue: usize,

    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Services granted to the adapter (DIRECT environments)
    #[serde(default)]
    pub services: Vec<ServiceEntry>,

    /// Remote queues to read
    #[serde(default)]
    pub queues: Vec<QueueSubscription>,
}

/// One service entitlement as written in config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub service_name: String,
    /// OBJECT when omitted
    #[serde(default = "default_service_type")]
    pub service_type: ServiceType,
    /// Absent means the session default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// Absent means the default context
    #[serde(default)]
    pub context: Option<String>,
    /// Granted rights; none when omitted
    #[serde(default)]
    pub rights: Vec<RightGrant>,
}

/// A `(right, access type)` pair.
///
/// Written as a list rather than a table so right names are not subject to
/// key case folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightGrant {
    pub right: AccessRight,
    pub access: AccessType,
}

/// A remote queue and the local queues its events feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSubscription {
    /// Local name, also the prefix of reader ids
    pub name: String,
    /// Messages endpoint of the remote queue; `$VARS` are expanded at load
    pub message_uri: String,
    /// Server-side wait time; polling never waits less than the poll frequency
    #[serde(default)]
    pub wait_time_secs: Option<u64>,
    /// Local queues fed by this subscription
    #[serde(default)]
    pub bindings: Vec<LocalQueueBinding>,
}

/// Routes events for one (zone, context, service) into a local queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalQueueBinding {
    pub service_name: String,
    #[serde(default = "default_service_type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

fn default_poll_frequency_secs() -> u64 {
    consumer::POLL_FREQUENCY_SECS
}

fn default_local_queue_capacity() -> usize {
    consumer::LOCAL_QUEUE_CAPACITY
}

fn default_consumer_workers() -> usize {
    consumer::CONSUMER_WORKERS
}

fn default_readers_per_queue() -> usize {
    consumer::READERS_PER_QUEUE
}

fn default_log_level() -> String {
    consumer::LOG_LEVEL.to_string()
}

fn default_service_type() -> ServiceType {
    ServiceType::Object
}

impl Default for ConsumerEnvironment {
    fn default() -> Self {
        Self {
            adapter_name: "Consumer".to_string(),
            environment_type: EnvironmentType::Direct,
            default_zone: "default".to_string(),
            poll_frequency_secs: default_poll_frequency_secs(),
            local_queue_capacity: default_local_queue_capacity(),
            consumer_workers: default_consumer_workers(),
            readers_per_queue: default_readers_per_queue(),
            log_level: default_log_level(),
            services: Vec::new(),
            queues: Vec::new(),
        }
    }
}

impl ConsumerEnvironment {
    /// Load from a TOML file with `SIF3_` environment overrides, then expand
    /// and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_overlay(path.as_ref(), None)
    }

    /// Like [`load`](Self::load), with an optional second file layered over the base
    pub fn load_with_overlay(base: &Path, overlay: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(overlay) = overlay {
            if overlay.exists() {
                info!("Loading consumer config overlay: {:?}", overlay);
                builder = builder.add_source(File::from(overlay));
            } else {
                warn!("Consumer config overlay not found: {:?}", overlay);
            }
        }

        let config = builder
            .add_source(env_source())
            .build()
            .context("Failed to build consumer configuration")?;

        let environment: Self = config
            .try_deserialize()
            .context("Failed to deserialize consumer configuration")?;
        environment.finish()
    }

    /// Parse from TOML text; environment overrides still apply
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .add_source(env_source())
            .build()
            .context("Failed to build consumer configuration")?;

        let environment: Self = config
            .try_deserialize()
            .context("Failed to deserialize consumer configuration")?;
        environment.finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.expand_env_vars()?;
        self.validate().map_err(anyhow::Error::msg)?;
        debug!(
            adapter = %self.adapter_name,
            queues = self.queues.len(),
            services = self.services.len(),
            "Consumer configuration loaded"
        );
        Ok(self)
    }

    /// Expand `${VAR}` references in queue URIs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for queue in &mut self.queues {
            let expanded = shellexpand::env(&queue.message_uri)
                .with_context(|| format!("Failed to expand message URI of queue {}", queue.name))?;
            queue.message_uri = expanded.into_owned();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.adapter_name.trim().is_empty() {
            return Err("adapter_name must not be empty".to_string());
        }
        if self.default_zone.trim().is_empty() {
            return Err("default_zone must not be empty".to_string());
        }
        if self.poll_frequency_secs == 0 {
            return Err("poll_frequency_secs must be at least 1".to_string());
        }
        if self.local_queue_capacity == 0 {
            return Err("local_queue_capacity must be at least 1".to_string());
        }
        if self.consumer_workers == 0 {
            return Err("consumer_workers must be at least 1".to_string());
        }
        if self.readers_per_queue == 0 {
            return Err("readers_per_queue must be at least 1".to_string());
        }

        for service in &self.services {
            if service.service_name.trim().is_empty() {
                return Err("service entries need a service_name".to_string());
            }
        }

        let mut names = HashSet::new();
        for queue in &self.queues {
            if queue.name.trim().is_empty() {
                return Err("queue entries need a name".to_string());
            }
            if !names.insert(queue.name.as_str()) {
                return Err(format!("queue {} is configured twice", queue.name));
            }
            if queue.message_uri.trim().is_empty() {
                return Err(format!("queue {} has no message_uri", queue.name));
            }
            if queue.bindings.iter().any(|b| b.service_name.trim().is_empty()) {
                return Err(format!("queue {} has a binding without service_name", queue.name));
            }
        }

        Ok(())
    }

    pub fn poll_frequency(&self) -> Duration {
        Duration::from_secs(self.poll_frequency_secs)
    }

    /// Zone value for a configured id; absent or equal ids map to the default zone
    pub fn zone_for(&self, id: Option<&str>) -> Zone {
        match id {
            Some(id) if id != self.default_zone => Zone::new(id, false),
            _ => Zone::new(self.default_zone.as_str(), true),
        }
    }

    pub fn context_for(&self, id: Option<&str>) -> Context {
        match id {
            Some(id) if id != DEFAULT_CONTEXT_NAME => Context::new(id, false),
            _ => Context::new(DEFAULT_CONTEXT_NAME, true),
        }
    }

    /// Service entries as session registry records
    pub fn service_infos(&self) -> Vec<ServiceInfo> {
        self.services
            .iter()
            .map(|entry| {
                let rights = entry
                    .rights
                    .iter()
                    .fold(ServiceRights::new(), |rights, grant| {
                        rights.with_right(grant.right, grant.access)
                    });
                ServiceInfo::new(
                    entry.service_name.as_str(),
                    entry.service_type,
                    self.zone_for(entry.zone.as_deref()),
                    self.context_for(entry.context.as_deref()),
                    rights,
                )
            })
            .collect()
    }
}

impl QueueSubscription {
    /// Configured wait time, zero when unset
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs.unwrap_or(0))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(env::PREFIX)
        .prefix_separator("_")
        .separator(env::SEPARATOR)
        .try_parsing(true)
}
