//! Environment management: how the consumer obtains its session
//!
//! A DIRECT environment builds the session from local configuration; a
//! BROKERED one asks an external provisioner (registration handshake with a
//! broker). The variant is chosen once from configuration at start-up.
//!
//! Sessions are handed out as `Arc<Session>` snapshots. A token refresh or
//! service reload swaps in a whole new `Arc`; readers keep the snapshot they
//! were started with.

pub mod brokered;
pub mod direct;

use async_trait::async_trait;
use consumer_config::{ConsumerEnvironment, EnvironmentType};
use parking_lot::RwLock;
use std::sync::Arc;
use types::Session;

use crate::error::{ConsumerError, Result};

pub use brokered::{BrokeredEnvironmentManager, ProvisionRequest, SessionProvisioner};
pub use direct::DirectEnvironmentManager;

/// Lifecycle of the environment session
#[async_trait]
pub trait EnvironmentManager: Send + Sync {
    /// Establish the session; calling again returns the live one
    async fn start(&self) -> Result<Arc<Session>>;

    /// Current session snapshot, `None` before start or after shutdown
    fn session(&self) -> Option<Arc<Session>>;

    /// Release the session
    async fn shutdown(&self) -> Result<()>;
}

/// The environment manager variants
pub enum EnvironmentManagerKind {
    Direct(DirectEnvironmentManager),
    Brokered(BrokeredEnvironmentManager),
}

impl EnvironmentManagerKind {
    /// Select the manager for `environment.environment_type`.
    ///
    /// BROKERED needs a provisioner; DIRECT ignores it.
    pub fn from_environment(
        environment: Arc<ConsumerEnvironment>,
        provisioner: Option<Arc<dyn SessionProvisioner>>,
    ) -> Result<Self> {
        match environment.environment_type {
            EnvironmentType::Direct => Ok(Self::Direct(DirectEnvironmentManager::new(environment))),
            EnvironmentType::Brokered => {
                let provisioner = provisioner.ok_or_else(|| {
                    ConsumerError::Configuration(
                        "BROKERED environment requires a session provisioner".to_string(),
                    )
                })?;
                Ok(Self::Brokered(BrokeredEnvironmentManager::new(
                    environment,
                    provisioner,
                )))
            }
        }
    }

    pub fn environment_type(&self) -> EnvironmentType {
        match self {
            Self::Direct(_) => EnvironmentType::Direct,
            Self::Brokered(_) => EnvironmentType::Brokered,
        }
    }

    fn inner(&self) -> &dyn EnvironmentManager {
        match self {
            Self::Direct(manager) => manager,
            Self::Brokered(manager) => manager,
        }
    }
}

#[async_trait]
impl EnvironmentManager for EnvironmentManagerKind {
    async fn start(&self) -> Result<Arc<Session>> {
        self.inner().start().await
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.inner().session()
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner().shutdown().await
    }
}

/// Holder of the current session; replacement is a single pointer swap
#[derive(Debug, Default)]
pub(crate) struct SessionSlot {
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionSlot {
    pub(crate) fn get(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    pub(crate) fn replace(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        *self.current.write() = Some(Arc::clone(&session));
        session
    }

    pub(crate) fn take(&self) -> Option<Arc<Session>> {
        self.current.write().take()
    }
}
