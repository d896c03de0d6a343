//! Enumerated header values

protocol_enum! {
    /// Value of the `messageType` header on a queued message
    MessageType("message type") {
        /// Delayed response to an earlier request
        Response => "RESPONSE",
        Event => "EVENT",
        Error => "ERROR",
    }
}

protocol_enum! {
    /// What happened upstream to the object an event describes
    EventAction("event action") {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
    }
}

protocol_enum! {
    /// Whether an update event carries the full object or only changed parts
    UpdateType("update type") {
        Full => "FULL",
        Partial => "PARTIAL",
    }
}

protocol_enum! {
    /// Value of the `responseAction` header on delayed responses
    ResponseAction("response action") {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
        Query => "QUERY",
    }
}

protocol_enum! {
    /// Value of the `requestType` request header
    RequestType("request type") {
        Immediate => "IMMEDIATE",
        Delayed => "DELAYED",
    }
}

protocol_enum! {
    /// Value of the `queryIntention` request header
    QueryIntention("query intention") {
        All => "ALL",
        OneOff => "ONE-OFF",
        NoCache => "NO-CACHE",
    }
}

protocol_enum! {
    /// How queues are allocated for an adapter
    QueueStrategy("queue strategy") {
        AdapterLevel => "ADAPTER_LEVEL",
        ZoneLevel => "ZONE_LEVEL",
        ObjectLevel => "OBJECT_LEVEL",
    }
}

impl Default for QueueStrategy {
    fn default() -> Self {
        QueueStrategy::AdapterLevel
    }
}

protocol_enum! {
    /// Role an adapter plays in an environment
    AdapterType("adapter type") {
        Consumer => "CONSUMER",
        Provider => "PROVIDER",
        EnvironmentProvider => "ENVIRONMENT_PROVIDER",
    }
}
