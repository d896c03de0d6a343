//! Response header field names and a case-insensitive property bag

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of queued message: RESPONSE, EVENT or ERROR
pub const HDR_MESSAGE_TYPE: &str = "messageType";
/// CREATE, UPDATE or DELETE on event messages
pub const HDR_EVENT_ACTION: &str = "eventAction";
/// FULL or PARTIAL on update events
pub const HDR_UPDATE_TYPE: &str = "Replacement";
pub const HDR_ZONE_ID: &str = "zoneId";
pub const HDR_CONTEXT_ID: &str = "contextId";
pub const HDR_SERVICE_NAME: &str = "serviceName";
pub const HDR_SERVICE_TYPE: &str = "serviceType";
/// Identifier of the adapter that generated an event
pub const HDR_GENERATOR_ID: &str = "generatorId";
/// Queue message id, echoed back on the next fetch to acknowledge it
pub const HDR_MESSAGE_ID: &str = "messageId";

/// Header properties of a single response.
///
/// Names compare case-insensitively as HTTP header names do. Blank values are
/// reported as absent: the protocol treats an empty header the same as a
/// missing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderProperties {
    // lowercased name -> (name as received, value)
    entries: BTreeMap<String, (String, String)>,
}

impl HeaderProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value under the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Trimmed value of a property, `None` if absent or blank
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate properties as (name as received, raw value)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = HeaderProperties::new();
        for (name, value) in iter {
            properties.set(name, value);
        }
        properties
    }
}
