//! Message classification
//!
//! Turns the loosely typed header strings of a queued message into the
//! message taxonomy plus the zone and context the message belongs to. No I/O
//! and no shared state beyond the two canonical default objects.

use std::sync::Arc;
use types::header::{
    HDR_CONTEXT_ID, HDR_EVENT_ACTION, HDR_MESSAGE_TYPE, HDR_SERVICE_NAME, HDR_SERVICE_TYPE,
    HDR_UPDATE_TYPE, HDR_ZONE_ID,
};
use types::{
    Context, EventAction, HeaderProperties, MessageType, ServiceType, Session, UpdateType, Zone,
};

use crate::error::DecodeError;

/// What a queued message turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Event(ClassifiedEvent),
    /// Delayed response to an earlier request
    DelayedResponse,
    /// Error message; handled by the poll step like an error payload
    Error,
}

/// Decoded routing and action data of an event message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub action: EventAction,
    /// `None` unless the action is UPDATE and a valid update type was given
    pub update_type: Option<UpdateType>,
    pub zone: Arc<Zone>,
    pub context: Arc<Context>,
    pub service_name: Option<String>,
    pub service_type: ServiceType,
}

/// Header decoder bound to one session's defaults
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    default_zone: Arc<Zone>,
    default_context: Arc<Context>,
}

impl MessageClassifier {
    pub fn new(session: &Session) -> Self {
        Self::with_defaults(Arc::clone(session.default_zone()), Context::default_context())
    }

    pub fn with_defaults(default_zone: Arc<Zone>, default_context: Arc<Context>) -> Self {
        Self {
            default_zone,
            default_context,
        }
    }

    pub fn classify(&self, headers: &HeaderProperties) -> Result<Classification, DecodeError> {
        match Self::message_type(headers)? {
            MessageType::Event => self.classify_event(headers).map(Classification::Event),
            MessageType::Response => Ok(Classification::DelayedResponse),
            MessageType::Error => Ok(Classification::Error),
        }
    }

    pub fn message_type(headers: &HeaderProperties) -> Result<MessageType, DecodeError> {
        let raw = headers
            .get(HDR_MESSAGE_TYPE)
            .ok_or(DecodeError::MissingHeader(HDR_MESSAGE_TYPE))?;
        Ok(raw.parse::<MessageType>()?)
    }

    /// Absent or invalid actions reject the message
    pub fn event_action(headers: &HeaderProperties) -> Result<EventAction, DecodeError> {
        let raw = headers
            .get(HDR_EVENT_ACTION)
            .ok_or(DecodeError::MissingHeader(HDR_EVENT_ACTION))?;
        Ok(raw.parse::<EventAction>()?)
    }

    /// Only read for UPDATE; absent or invalid values mean "unspecified"
    pub fn update_type(headers: &HeaderProperties, action: EventAction) -> Option<UpdateType> {
        if action != EventAction::Update {
            return None;
        }
        headers.get(HDR_UPDATE_TYPE)?.parse().ok()
    }

    /// Absent service type means OBJECT; anything else must be a known literal
    pub fn service_type(headers: &HeaderProperties) -> Result<ServiceType, DecodeError> {
        match headers.get(HDR_SERVICE_TYPE) {
            Some(raw) => Ok(raw.parse::<ServiceType>()?),
            None => Ok(ServiceType::Object),
        }
    }

    /// Zone named by the headers.
    ///
    /// Missing zone, or a zone id equal to the default zone's, yields the
    /// canonical default zone object itself.
    pub fn resolve_zone(&self, headers: &HeaderProperties) -> Arc<Zone> {
        match headers.get(HDR_ZONE_ID) {
            Some(id) if id != self.default_zone.id() => Arc::new(Zone::new(id, false)),
            _ => Arc::clone(&self.default_zone),
        }
    }

    pub fn resolve_context(&self, headers: &HeaderProperties) -> Arc<Context> {
        match headers.get(HDR_CONTEXT_ID) {
            Some(id) if id != self.default_context.id() => Arc::new(Context::new(id, false)),
            _ => Arc::clone(&self.default_context),
        }
    }

    fn classify_event(&self, headers: &HeaderProperties) -> Result<ClassifiedEvent, DecodeError> {
        let action = Self::event_action(headers)?;
        Ok(ClassifiedEvent {
            action,
            update_type: Self::update_type(headers, action),
            zone: self.resolve_zone(headers),
            context: self.resolve_context(headers),
            service_name: headers.get(HDR_SERVICE_NAME).map(str::to_string),
            service_type: Self::service_type(headers)?,
        })
    }
}
