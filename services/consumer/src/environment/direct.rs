//! DIRECT environments: the session comes straight from local configuration

use async_trait::async_trait;
use consumer_config::ConsumerEnvironment;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use types::{ServiceInfo, Session};
use uuid::Uuid;

use super::{EnvironmentManager, SessionSlot};
use crate::error::{ConsumerError, Result};

pub struct DirectEnvironmentManager {
    environment: Arc<ConsumerEnvironment>,
    slot: SessionSlot,
    next_session_id: AtomicU64,
}

impl DirectEnvironmentManager {
    pub fn new(environment: Arc<ConsumerEnvironment>) -> Self {
        Self {
            environment,
            slot: SessionSlot::default(),
            next_session_id: AtomicU64::new(1),
        }
    }

    fn build_session(&self) -> Result<Session> {
        let mut session = Session::new(
            self.environment.adapter_name.as_str(),
            self.environment.zone_for(None),
            self.environment.service_infos(),
        )?
        .with_environment(Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        session.session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(session)
    }

    /// Swap in a new service list; readers started earlier keep the old snapshot
    pub fn reload_services(&self, services: Vec<ServiceInfo>) -> Result<Arc<Session>> {
        let current = self.slot.get().ok_or_else(|| {
            ConsumerError::Provision("environment not started".to_string())
        })?;
        let reloaded = current.with_services(services)?;
        info!(
            "Reloaded {} service(s) for {}",
            reloaded.services().len(),
            reloaded.environment_name()
        );
        Ok(self.slot.replace(reloaded))
    }
}

#[async_trait]
impl EnvironmentManager for DirectEnvironmentManager {
    async fn start(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.slot.get() {
            return Ok(session);
        }

        let session = self.build_session()?;
        info!(
            "Direct environment started for {} with {} service(s), default zone {}",
            session.adapter_name,
            session.services().len(),
            session.default_zone()
        );
        Ok(self.slot.replace(session))
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.slot.get()
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(session) = self.slot.take() {
            info!("Direct environment for {} shut down", session.adapter_name);
        }
        Ok(())
    }
}
