//! Error types for the queue consumer

use thiserror::Error;
use types::{ParseEnumError, RegistryError};

/// Result type alias for consumer operations
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Failure of a single call to the remote queue
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not reach the queue endpoint
    #[error("Connection to {uri} failed: {reason}")]
    Connection {
        /// Endpoint that was being called
        uri: String,
        /// Reason reported by the transport
        reason: String,
    },

    /// No answer within the client's deadline
    #[error("Request to {uri} timed out")]
    Timeout {
        /// Endpoint that was being called
        uri: String,
    },

    /// The service call itself failed
    #[error("Service invocation failed: {0}")]
    Invocation(String),
}

/// A queued message whose headers could not be decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Required header absent or blank
    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    /// Header present but not a known literal
    #[error(transparent)]
    InvalidValue(#[from] ParseEnumError),
}

/// Main error type for consumer operations
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Reader could not be constructed; the subscription never starts
    #[error("Setup failed for queue {queue}: {reason}")]
    Setup {
        /// Queue the reader was meant to serve
        queue: String,
        /// What was wrong
        reason: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Session service list violates its invariants
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Environment session could not be obtained or released
    #[error("Session provisioning failed: {0}")]
    Provision(String),

    /// Consumer configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A task did not stop cleanly
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl ConsumerError {
    pub fn setup(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        ConsumerError::Setup {
            queue: queue.into(),
            reason: reason.into(),
        }
    }

    /// Handled inside the poll loop by logging and carrying on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConsumerError::Transport(_) | ConsumerError::Decode(_))
    }

    /// Stops the subscription or the process from starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsumerError::Setup { .. }
                | ConsumerError::Registry(_)
                | ConsumerError::Provision(_)
                | ConsumerError::Configuration(_)
        )
    }
}
