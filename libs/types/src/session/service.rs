//! Services an adapter is entitled to, with their access matrix

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::identifiers::{Context, Zone};

protocol_enum! {
    /// Value of the `serviceType` header
    ServiceType("service type") {
        Object => "OBJECT",
        Function => "FUNCTION",
        Utility => "UTILITY",
        ServicePath => "SERVICEPATH",
        XqueryTemplate => "XQUERYTEMPLATE",
    }
}

protocol_enum! {
    /// Permission category on a service
    AccessRight("access right") {
        Query => "QUERY",
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
        Provide => "PROVIDE",
        Subscribe => "SUBSCRIBE",
        Admin => "ADMIN",
    }
}

protocol_enum! {
    /// Grant level for an access right
    AccessType("access type") {
        Supported => "SUPPORTED",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Requested => "REQUESTED",
    }
}

/// Access matrix of one service.
///
/// Each right carries exactly one grant level; `(right, type)` is granted when
/// the right is present at that level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRights {
    rights: BTreeMap<AccessRight, AccessType>,
}

impl ServiceRights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_right(mut self, right: AccessRight, access_type: AccessType) -> Self {
        self.rights.insert(right, access_type);
        self
    }

    pub fn set_right(&mut self, right: AccessRight, access_type: AccessType) {
        self.rights.insert(right, access_type);
    }

    pub fn has_right(&self, right: AccessRight, access_type: AccessType) -> bool {
        self.rights.get(&right) == Some(&access_type)
    }

    pub fn access_type(&self, right: AccessRight) -> Option<AccessType> {
        self.rights.get(&right).copied()
    }
}

/// One entry of a session's service list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name as used in event headers
    pub service_name: String,
    pub service_type: ServiceType,
    /// Zone the entitlement applies to
    pub zone: Zone,
    /// Context the entitlement applies to
    pub context: Context,
    /// Granted (right, access) pairs
    #[serde(default)]
    pub rights: ServiceRights,
}

impl ServiceInfo {
    pub fn new(
        service_name: impl Into<String>,
        service_type: ServiceType,
        zone: Zone,
        context: Context,
        rights: ServiceRights,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_type,
            zone,
            context,
            rights,
        }
    }

    /// Zone matches an explicit zone by id, or any default-flagged zone when absent
    pub(crate) fn zone_matches(&self, zone: Option<&Zone>) -> bool {
        match zone {
            Some(zone) => zone.id() == self.zone.id(),
            None => self.zone.is_default(),
        }
    }

    pub(crate) fn context_matches(&self, context: Option<&Context>) -> bool {
        match context {
            Some(context) => context.id() == self.context.id(),
            None => self.context.is_default(),
        }
    }
}
