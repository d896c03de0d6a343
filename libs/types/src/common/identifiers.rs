//! Zone and context identities
//!
//! Both are protocol-level partitioning dimensions. Each carries an id and an
//! "is default" flag; a session has exactly one default zone and the process
//! has exactly one default context.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Id of the protocol-wide default context
pub const DEFAULT_CONTEXT_NAME: &str = "DEFAULT";

static DEFAULT_CONTEXT: Lazy<Arc<Context>> =
    Lazy::new(|| Arc::new(Context::new(DEFAULT_CONTEXT_NAME, true)));

/// A zone an adapter can be entitled to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    id: String,
    #[serde(default)]
    is_default: bool,
}

impl Zone {
    pub fn new(id: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: id.into(),
            is_default,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A context within a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    id: String,
    #[serde(default)]
    is_default: bool,
}

impl Context {
    pub fn new(id: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: id.into(),
            is_default,
        }
    }

    /// The canonical default context shared by the whole process.
    ///
    /// Every call returns a clone of the same `Arc`, so callers can rely on
    /// `Arc::ptr_eq` to recognise it.
    pub fn default_context() -> Arc<Context> {
        Arc::clone(&DEFAULT_CONTEXT)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
