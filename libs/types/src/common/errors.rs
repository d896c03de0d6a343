//! Error types for protocol literal parsing and session registry validation

use thiserror::Error;

/// A header or configuration value did not name a known protocol literal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown {kind} value: '{value}'")]
pub struct ParseEnumError {
    /// Protocol enumeration that was being parsed (e.g. "message type")
    pub kind: &'static str,
    /// The offending value as received
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Violations of the session service-list invariants, detected at load time
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// More than one entry for the same (service, zone, context) tuple
    #[error("Duplicate service entry '{service}' for zone '{zone}' and context '{context}'")]
    DuplicateService {
        service: String,
        zone: String,
        context: String,
    },

    /// A service is flagged as living in the default zone but names a different zone
    #[error("Service '{service}' marks zone '{found}' as default but the session default zone is '{expected}'")]
    ConflictingDefaultZone {
        service: String,
        expected: String,
        found: String,
    },

    /// Two services disagree on which context is the default one
    #[error("Service '{service}' marks context '{found}' as default but '{expected}' is already the default context")]
    ConflictingDefaultContext {
        service: String,
        expected: String,
        found: String,
    },

    /// The session default zone itself must carry the default flag
    #[error("Session default zone '{0}' is not flagged as default")]
    DefaultZoneNotFlagged(String),

    /// Identifiers must not be blank
    #[error("Empty {0} identifier")]
    EmptyIdentifier(&'static str),
}
