//! Events delivered to local consumers

use std::sync::Arc;

use crate::common::identifiers::{Context, Zone};
use crate::protocol::header::HeaderProperties;
use crate::protocol::values::{EventAction, UpdateType};

/// Header-derived metadata travelling with an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMetadata {
    /// Every header property of the response the event arrived in
    pub properties: HeaderProperties,
    /// Adapter that generated the event, if it said so
    pub generator_id: Option<String>,
}

impl EventMetadata {
    pub fn from_headers(properties: HeaderProperties) -> Self {
        let generator_id = properties
            .get(crate::protocol::header::HDR_GENERATOR_ID)
            .map(str::to_string);
        Self {
            properties,
            generator_id,
        }
    }
}

/// One accepted event, consumed exactly once by whichever consumer pops it
#[derive(Debug, Clone)]
pub struct EventInfo {
    pub payload: Option<String>,
    pub media_type: Option<String>,
    pub event_action: EventAction,
    /// Only meaningful for [`EventAction::Update`]; `None` when unspecified
    pub update_type: Option<UpdateType>,
    pub zone: Arc<Zone>,
    pub context: Arc<Context>,
    pub metadata: EventMetadata,
    /// Queue message id the event was delivered under
    pub message_id: Option<String>,
    /// Reader that fetched the event
    pub reader_id: String,
}
