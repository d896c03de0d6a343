//! # SIF3 Consumer Types
//!
//! Shared vocabulary for the queue consumer: partitioning identities, the
//! session/service data model with its access matrix, the header taxonomy that
//! event messages are decoded from, and the event value handed to local
//! consumers.
//!
//! ## Design Philosophy
//!
//! - **No I/O**: everything here is pure data and lookup logic
//! - **Snapshot sessions**: a [`Session`] is immutable once built; reloads
//!   produce a new value that callers swap in atomically
//! - **Identity-preserving defaults**: the default zone and default context
//!   are shared `Arc`s so resolution can hand back the canonical object
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{
//!     AccessRight, AccessType, Context, ServiceInfo, ServiceRights, ServiceType, Session, Zone,
//! };
//!
//! let rights = ServiceRights::new().with_right(AccessRight::Query, AccessType::Approved);
//! let service = ServiceInfo::new(
//!     "StudentPersonals",
//!     ServiceType::Object,
//!     Zone::new("schoolA", false),
//!     Context::default_context().as_ref().clone(),
//!     rights,
//! );
//!
//! let session =
//!     Session::new("StudentConsumer", Zone::new("district", true), vec![service]).unwrap();
//! assert!(session.has_access(
//!     AccessRight::Query,
//!     AccessType::Approved,
//!     "StudentPersonals",
//!     Some(&Zone::new("schoolA", false)),
//!     None,
//! ));
//! ```

pub mod common;
#[macro_use]
pub mod protocol;
pub mod event;
pub mod session;

pub use common::errors::{ParseEnumError, RegistryError};
pub use common::identifiers::{Context, Zone, DEFAULT_CONTEXT_NAME};
pub use event::{EventInfo, EventMetadata};
pub use protocol::header::{self as header, HeaderProperties};
pub use protocol::values::{
    AdapterType, EventAction, MessageType, QueryIntention, QueueStrategy, RequestType,
    ResponseAction, UpdateType,
};
pub use session::service::{AccessRight, AccessType, ServiceInfo, ServiceRights, ServiceType};
pub use session::Session;
