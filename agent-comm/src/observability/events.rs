//! Canonical structured event names used across `agent-comm`.

// Transport worker events.
pub const TRANSPORT_SUBSCRIBE_OK: &str = "transport_subscribe_ok";
pub const TRANSPORT_SUBSCRIBE_FAILED: &str = "transport_subscribe_failed";
pub const TRANSPORT_UNSUBSCRIBE_OK: &str = "transport_unsubscribe_ok";
pub const TRANSPORT_UNSUBSCRIBE_FAILED: &str = "transport_unsubscribe_failed";
pub const TRANSPORT_PUBLISH_OK: &str = "transport_publish_ok";
pub const TRANSPORT_PUBLISH_FAILED: &str = "transport_publish_failed";
pub const TRANSPORT_WORKER_STOPPED: &str = "transport_worker_stopped";

// Subscription registry and outbound queue events.
pub const SUBSCRIPTION_ACQUIRE: &str = "subscription_acquire";
pub const SUBSCRIPTION_RELEASE: &str = "subscription_release";
pub const SUBSCRIPTION_RELEASE_STALE: &str = "subscription_release_stale";
pub const SUBSCRIPTION_REPLAY: &str = "subscription_replay";
pub const PUBLICATION_DEFERRED: &str = "publication_deferred";
pub const PUBLICATION_FLUSH: &str = "publication_flush";

// Ingress and dispatch events.
pub const INGRESS_RECEIVE: &str = "ingress_receive";
pub const INGRESS_RECV_LAGGED: &str = "ingress_recv_lagged";
pub const INGRESS_RECV_CLOSED: &str = "ingress_recv_closed";
pub const DISPATCH_DECODE_FAILED: &str = "dispatch_decode_failed";
pub const DISPATCH_RESPONSE_REJECTED: &str = "dispatch_response_rejected";
pub const DISPATCH_BACKLOG_HIGH: &str = "dispatch_backlog_high";
pub const OBSERVABLE_DRAINED: &str = "observable_drained";

// IO routing events.
pub const IO_ASSOCIATE_IGNORED: &str = "io_associate_ignored";
pub const IO_SOURCE_ROUTE_CHANGED: &str = "io_source_route_changed";
pub const IO_SOURCE_DISASSOCIATED: &str = "io_source_disassociated";
pub const IO_ACTOR_ASSOCIATED: &str = "io_actor_associated";
pub const IO_ACTOR_DISASSOCIATED: &str = "io_actor_disassociated";
pub const IO_VALUE_DROPPED: &str = "io_value_dropped";

// Lifecycle and connection events.
pub const CONNECTION_STATE_CHANGED: &str = "connection_state_changed";
pub const OPERATING_STATE_CHANGED: &str = "operating_state_changed";
pub const LIFECYCLE_START: &str = "lifecycle_start";
pub const LIFECYCLE_STARTED: &str = "lifecycle_started";
pub const LIFECYCLE_START_FAILED: &str = "lifecycle_start_failed";
pub const LIFECYCLE_STOP: &str = "lifecycle_stop";
pub const LIFECYCLE_STOPPED: &str = "lifecycle_stopped";
pub const LIFECYCLE_DEADVERTISE_FAILED: &str = "lifecycle_deadvertise_failed";
pub const LIFECYCLE_DISCONNECT_FAILED: &str = "lifecycle_disconnect_failed";
pub const IDENTITY_ADVERTISE: &str = "identity_advertise";
pub const IDENTITY_RESOLVE: &str = "identity_resolve";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
