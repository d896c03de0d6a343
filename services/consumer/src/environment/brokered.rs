//! BROKERED environments: a broker provisions the session
//!
//! The registration handshake itself belongs to an external
//! [`SessionProvisioner`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use consumer_config::ConsumerEnvironment;
use std::sync::Arc;
use tracing::{info, warn};
use types::Session;
use uuid::Uuid;

use super::{EnvironmentManager, SessionSlot};
use crate::error::{ConsumerError, Result};

/// What the consumer asks the broker for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Fresh per attempt so the broker can spot retries
    pub request_id: Uuid,
    pub adapter_name: String,
    pub default_zone: String,
}

/// Registration handshake with a broker
#[async_trait]
pub trait SessionProvisioner: Send + Sync {
    async fn provision(&self, request: &ProvisionRequest) -> Result<Session>;

    async fn release(&self, session: &Session) -> Result<()>;
}

pub struct BrokeredEnvironmentManager {
    environment: Arc<ConsumerEnvironment>,
    provisioner: Arc<dyn SessionProvisioner>,
    slot: SessionSlot,
}

impl BrokeredEnvironmentManager {
    pub fn new(
        environment: Arc<ConsumerEnvironment>,
        provisioner: Arc<dyn SessionProvisioner>,
    ) -> Self {
        Self {
            environment,
            provisioner,
            slot: SessionSlot::default(),
        }
    }

    async fn provision(&self) -> Result<Arc<Session>> {
        let request = ProvisionRequest {
            request_id: Uuid::new_v4(),
            adapter_name: self.environment.adapter_name.clone(),
            default_zone: self.environment.default_zone.clone(),
        };

        let session = self.provisioner.provision(&request).await?;
        if session.adapter_name != request.adapter_name {
            return Err(ConsumerError::Provision(format!(
                "broker returned a session for '{}', expected '{}'",
                session.adapter_name, request.adapter_name
            )));
        }

        info!(
            "Brokered session {} provisioned for {} (request {})",
            session.session_id, session.adapter_name, request.request_id
        );
        Ok(self.slot.replace(session))
    }

    /// True when there is no session or its security token has expired
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.slot
            .get()
            .map(|session| session.is_security_token_expired(now))
            .unwrap_or(true)
    }

    /// Re-provision and swap the new session in
    pub async fn refresh(&self) -> Result<Arc<Session>> {
        self.provision().await
    }
}

#[async_trait]
impl EnvironmentManager for BrokeredEnvironmentManager {
    async fn start(&self) -> Result<Arc<Session>> {
        match self.slot.get() {
            Some(session) if !session.is_security_token_expired(Utc::now()) => Ok(session),
            Some(_) => {
                warn!("Security token expired, provisioning a new session");
                self.provision().await
            }
            None => self.provision().await,
        }
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.slot.get()
    }

    async fn shutdown(&self) -> Result<()> {
        match self.slot.take() {
            Some(session) => {
                self.provisioner.release(&session).await?;
                info!("Brokered session {} released", session.session_id);
                Ok(())
            }
            None => Ok(()),
        }
    }
}
