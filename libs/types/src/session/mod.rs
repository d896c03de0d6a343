//! # Session - Service Registry and Access Model
//!
//! A [`Session`] is the in-memory view of an established adapter/environment
//! pairing: who the adapter is, its security token, its default zone and the
//! ordered list of services it is entitled to.
//!
//! ## Invariants
//!
//! Checked once in [`Session::new`] / [`Session::with_services`]:
//! - at most one [`ServiceInfo`] per (service name, zone id, context id)
//! - every default-flagged zone in the service list is the session default zone
//! - all default-flagged contexts share a single id
//!
//! Because these hold, access checks resolve to at most one governing entry
//! and never depend on the order of the service list.
//!
//! ## Mutation
//!
//! Sessions are never mutated in place while readers hold them. Token refresh
//! or service reload builds a new `Session` which the environment layer swaps
//! in as a whole (`Arc<Session>` replacement).

pub mod service;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::common::errors::RegistryError;
use crate::common::identifiers::{Context, Zone};
use crate::protocol::values::{AdapterType, QueueStrategy};
use service::{AccessRight, AccessType, ServiceInfo, ServiceType};

/// Live session of one adapter in one environment
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: u64,
    pub adapter_name: String,
    pub adapter_type: AdapterType,
    pub environment_id: Option<String>,
    pub session_token: Option<String>,
    pub security_token: Option<String>,
    pub security_token_expiry: Option<DateTime<Utc>>,
    pub queue_strategy: QueueStrategy,
    pub created: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    default_zone: Arc<Zone>,
    services: Vec<ServiceInfo>,
}

impl Session {
    /// Build a consumer session with a validated service list
    pub fn new(
        adapter_name: impl Into<String>,
        default_zone: Zone,
        services: Vec<ServiceInfo>,
    ) -> Result<Self, RegistryError> {
        let adapter_name = adapter_name.into();
        if adapter_name.trim().is_empty() {
            return Err(RegistryError::EmptyIdentifier("adapter name"));
        }
        if default_zone.id().trim().is_empty() {
            return Err(RegistryError::EmptyIdentifier("zone"));
        }
        if !default_zone.is_default() {
            return Err(RegistryError::DefaultZoneNotFlagged(
                default_zone.id().to_string(),
            ));
        }

        validate_services(&default_zone, &services)?;

        let now = Utc::now();
        Ok(Self {
            session_id: 0,
            adapter_name,
            adapter_type: AdapterType::Consumer,
            environment_id: None,
            session_token: None,
            security_token: None,
            security_token_expiry: None,
            queue_strategy: QueueStrategy::default(),
            created: now,
            last_accessed: now,
            default_zone: Arc::new(default_zone),
            services,
        })
    }

    /// New session value with a reloaded service list; the receiver is left untouched
    pub fn with_services(&self, services: Vec<ServiceInfo>) -> Result<Self, RegistryError> {
        validate_services(&self.default_zone, &services)?;
        Ok(Self {
            services,
            last_accessed: Utc::now(),
            ..self.clone()
        })
    }

    pub fn with_environment(
        mut self,
        environment_id: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        self.environment_id = Some(environment_id.into());
        self.session_token = Some(session_token.into());
        self
    }

    pub fn with_security_token(
        mut self,
        token: impl Into<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        self.security_token = Some(token.into());
        self.security_token_expiry = expiry;
        self
    }

    /// A token without expiry never expires
    pub fn is_security_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.security_token_expiry
            .map(|expiry| expiry <= now)
            .unwrap_or(false)
    }

    /// Canonical default zone object; every call hands out the same `Arc`
    pub fn default_zone(&self) -> &Arc<Zone> {
        &self.default_zone
    }

    pub fn services(&self) -> &[ServiceInfo] {
        &self.services
    }

    /// Display name of the environment
    pub fn environment_name(&self) -> &str {
        &self.adapter_name
    }

    /// Check whether `service_name` is granted `(right, access_type)` in the
    /// given zone and context.
    ///
    /// An absent zone or context means "the default one": only entries flagged
    /// as default in that dimension match.
    pub fn has_access(
        &self,
        right: AccessRight,
        access_type: AccessType,
        service_name: &str,
        zone: Option<&Zone>,
        context: Option<&Context>,
    ) -> bool {
        self.services
            .iter()
            .find(|service| {
                service.service_name == service_name
                    && service.zone_matches(zone)
                    && service.context_matches(context)
            })
            .map(|service| service.rights.has_right(right, access_type))
            .unwrap_or(false)
    }

    /// All entries for a service across zones and contexts
    pub fn services_for(&self, service_name: &str, service_type: ServiceType) -> Vec<&ServiceInfo> {
        self.services
            .iter()
            .filter(|service| {
                service.service_name == service_name && service.service_type == service_type
            })
            .collect()
    }

    /// Entries for a service that additionally grant `(right, access_type)`
    pub fn services_with_right(
        &self,
        service_name: &str,
        service_type: ServiceType,
        right: AccessRight,
        access_type: AccessType,
    ) -> Vec<&ServiceInfo> {
        self.services_for(service_name, service_type)
            .into_iter()
            .filter(|service| service.rights.has_right(right, access_type))
            .collect()
    }

    /// The single entry for an exact (zone, context, name, type) tuple
    pub fn service_info(
        &self,
        zone: &Zone,
        context: &Context,
        service_name: &str,
        service_type: ServiceType,
    ) -> Option<&ServiceInfo> {
        self.services_for(service_name, service_type)
            .into_iter()
            .find(|service| service.zone.id() == zone.id() && service.context.id() == context.id())
    }
}

fn validate_services(default_zone: &Zone, services: &[ServiceInfo]) -> Result<(), RegistryError> {
    let mut seen = HashSet::with_capacity(services.len());
    let mut default_context: Option<&str> = None;

    for service in services {
        if service.service_name.trim().is_empty() {
            return Err(RegistryError::EmptyIdentifier("service name"));
        }

        let key = (
            service.service_name.as_str(),
            service.zone.id(),
            service.context.id(),
        );
        if !seen.insert(key) {
            return Err(RegistryError::DuplicateService {
                service: service.service_name.clone(),
                zone: service.zone.id().to_string(),
                context: service.context.id().to_string(),
            });
        }

        if service.zone.is_default() && service.zone.id() != default_zone.id() {
            return Err(RegistryError::ConflictingDefaultZone {
                service: service.service_name.clone(),
                expected: default_zone.id().to_string(),
                found: service.zone.id().to_string(),
            });
        }

        if service.context.is_default() {
            match default_context {
                Some(expected) if expected != service.context.id() => {
                    return Err(RegistryError::ConflictingDefaultContext {
                        service: service.service_name.clone(),
                        expected: expected.to_string(),
                        found: service.context.id().to_string(),
                    });
                }
                Some(_) => {}
                None => default_context = Some(service.context.id()),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::service::ServiceRights;
    use super::*;
    use chrono::Duration;

    fn default_ctx() -> Context {
        Context::default_context().as_ref().clone()
    }

    fn foo_in_zone_a() -> ServiceInfo {
        ServiceInfo::new(
            "Foo",
            ServiceType::Object,
            Zone::new("zoneA", false),
            default_ctx(),
            ServiceRights::new().with_right(AccessRight::Query, AccessType::Approved),
        )
    }

    fn session(services: Vec<ServiceInfo>) -> Session {
        Session::new("TestConsumer", Zone::new("home", true), services).unwrap()
    }

    #[test]
    fn test_access_matrix() {
        let session = session(vec![foo_in_zone_a()]);
        let zone_a = Zone::new("zoneA", false);
        let zone_b = Zone::new("zoneB", false);

        assert!(session.has_access(
            AccessRight::Query,
            AccessType::Approved,
            "Foo",
            Some(&zone_a),
            None
        ));
        assert!(!session.has_access(
            AccessRight::Query,
            AccessType::Approved,
            "Foo",
            Some(&zone_b),
            None
        ));
        assert!(!session.has_access(
            AccessRight::Update,
            AccessType::Approved,
            "Foo",
            Some(&zone_a),
            None
        ));
        assert!(!session.has_access(
            AccessRight::Query,
            AccessType::Approved,
            "Bar",
            Some(&zone_a),
            None
        ));
    }

    #[test]
    fn test_absent_zone_matches_only_default_zone_entries() {
        let in_default_zone = ServiceInfo::new(
            "Foo",
            ServiceType::Object,
            Zone::new("home", true),
            default_ctx(),
            ServiceRights::new().with_right(AccessRight::Create, AccessType::Approved),
        );
        let session = session(vec![foo_in_zone_a(), in_default_zone]);

        // zoneA grants QUERY only, the default zone grants CREATE only
        assert!(session.has_access(AccessRight::Create, AccessType::Approved, "Foo", None, None));
        assert!(!session.has_access(AccessRight::Query, AccessType::Approved, "Foo", None, None));
    }

    #[test]
    fn test_explicit_context_must_match_by_id() {
        let session = session(vec![foo_in_zone_a()]);
        let zone_a = Zone::new("zoneA", false);
        let other = Context::new("ctx2", false);

        assert!(!session.has_access(
            AccessRight::Query,
            AccessType::Approved,
            "Foo",
            Some(&zone_a),
            Some(&other)
        ));
        assert!(session.has_access(
            AccessRight::Query,
            AccessType::Approved,
            "Foo",
            Some(&zone_a),
            Some(&Context::new("DEFAULT", false))
        ));
    }

    #[test]
    fn test_duplicate_tuple_rejected() {
        let err = Session::new(
            "TestConsumer",
            Zone::new("home", true),
            vec![foo_in_zone_a(), foo_in_zone_a()],
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateService { .. }));
    }

    #[test]
    fn test_conflicting_default_zone_rejected() {
        let stray = ServiceInfo::new(
            "Foo",
            ServiceType::Object,
            Zone::new("elsewhere", true),
            default_ctx(),
            ServiceRights::new(),
        );
        let err = Session::new("TestConsumer", Zone::new("home", true), vec![stray]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConflictingDefaultZone {
                service: "Foo".to_string(),
                expected: "home".to_string(),
                found: "elsewhere".to_string(),
            }
        );
    }

    #[test]
    fn test_conflicting_default_context_rejected() {
        let other_default = ServiceInfo::new(
            "Bar",
            ServiceType::Object,
            Zone::new("zoneA", false),
            Context::new("OTHER", true),
            ServiceRights::new(),
        );
        let err = Session::new(
            "TestConsumer",
            Zone::new("home", true),
            vec![foo_in_zone_a(), other_default],
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::ConflictingDefaultContext { .. }));
    }

    #[test]
    fn test_default_zone_must_be_flagged() {
        let err = Session::new("TestConsumer", Zone::new("home", false), vec![]).unwrap_err();
        assert_eq!(err, RegistryError::DefaultZoneNotFlagged("home".to_string()));
    }

    #[test]
    fn test_service_projections() {
        let functional = ServiceInfo::new(
            "Foo",
            ServiceType::Function,
            Zone::new("zoneC", false),
            default_ctx(),
            ServiceRights::new(),
        );
        let second_zone = ServiceInfo::new(
            "Foo",
            ServiceType::Object,
            Zone::new("zoneB", false),
            default_ctx(),
            ServiceRights::new().with_right(AccessRight::Query, AccessType::Rejected),
        );
        let session = session(vec![foo_in_zone_a(), functional, second_zone]);

        assert_eq!(session.services_for("Foo", ServiceType::Object).len(), 2);
        assert_eq!(session.services_for("Foo", ServiceType::Function).len(), 1);

        let approved = session.services_with_right(
            "Foo",
            ServiceType::Object,
            AccessRight::Query,
            AccessType::Approved,
        );
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].zone.id(), "zoneA");

        let exact = session.service_info(
            &Zone::new("zoneB", false),
            &default_ctx(),
            "Foo",
            ServiceType::Object,
        );
        assert_eq!(exact.map(|s| s.zone.id()), Some("zoneB"));
        let zone_c = Zone::new("zoneC", false);
        assert!(session
            .service_info(&zone_c, &default_ctx(), "Foo", ServiceType::Object)
            .is_none());
        let function =
            session.service_info(&zone_c, &default_ctx(), "Foo", ServiceType::Function);
        assert_eq!(function.map(|s| s.service_type), Some(ServiceType::Function));
        assert!(session
            .services_with_right(
                "Foo",
                ServiceType::Function,
                AccessRight::Query,
                AccessType::Approved
            )
            .is_empty());
        assert_eq!(session.services().len(), 3);
    }

    #[test]
    fn test_reload_leaves_original_untouched() {
        let original = session(vec![foo_in_zone_a()]);
        let reloaded = original.with_services(vec![]).unwrap();

        assert_eq!(original.services().len(), 1);
        assert!(reloaded.services().is_empty());
        assert!(Arc::ptr_eq(original.default_zone(), reloaded.default_zone()));
    }

    #[test]
    fn test_security_token_expiry() {
        let now = Utc::now();
        let session = session(vec![]);
        assert!(!session.is_security_token_expired(now));

        let expiring = session.with_security_token("token", Some(now - Duration::seconds(1)));
        assert!(expiring.is_security_token_expired(now));
        assert_eq!(expiring.environment_name(), "TestConsumer");
        assert_eq!(expiring.queue_strategy, QueueStrategy::AdapterLevel);
    }
}
