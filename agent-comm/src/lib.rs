/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # agent-comm
//!
//! `agent-comm` is the communication core of a distributed agent system. Agents
//! exchange typed events over a topic-based pub/sub [`Transport`]: one-way events
//! (Advertise, Deadvertise, Channel, Associate), request/response pairs correlated
//! over the wire (Discover/Resolve, Update/Complete, Query/Retrieve, Call/Return),
//! IO values flowing over routes assigned by Associate events, and raw passthrough
//! on arbitrary non-protocol topics.
//!
//! Typical usage is centered on [`CommunicationManager`].
//!
//! ## Quick start
//!
//! ```
//! use agent_comm::{
//!     ChannelEvent, CommObject, CommunicationManager, CommunicationOptions, CoreType,
//! };
//! use loopback_transport::LoopbackBroker;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_stream::StreamExt;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = LoopbackBroker::new();
//! let receiver_client = broker.client();
//!
//! let sender = CommunicationManager::new(
//!     Arc::new(broker.client()),
//!     CommunicationOptions::default().with_identity_name("sender"),
//! )
//! .unwrap();
//! let receiver = CommunicationManager::new(
//!     Arc::new(receiver_client.clone()),
//!     CommunicationOptions::default().with_identity_name("receiver"),
//! )
//! .unwrap();
//! sender.start().await.unwrap();
//! receiver.start().await.unwrap();
//!
//! let mut alerts = receiver.observe_channel("alerts").unwrap().attach().unwrap();
//! while !receiver_client.subscriptions().iter().any(|t| t.contains("CHN:alerts")) {
//!     tokio::time::sleep(Duration::from_millis(5)).await;
//! }
//!
//! let overheat = CommObject::new(CoreType::Log, "overheat");
//! sender
//!     .publish_channel("alerts", ChannelEvent::with_object(overheat.clone()))
//!     .unwrap();
//!
//! let event = alerts.next().await.unwrap();
//! assert_eq!(event.source_id, sender.identity().object_id);
//! assert_eq!(event.data.object, Some(overheat));
//!
//! receiver.stop().await.unwrap();
//! sender.stop().await.unwrap();
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`CommunicationManager`] and the option/object/event types
//! - Routing: topic codec, event-type catalogue, wildcard matching
//! - Data plane: subscription reference counting, offline outbound queue, ingress
//!   fan-out, lazily activated observables, request correlation
//! - Control plane: agent lifecycle and the IO routing table
//! - Runtime: the transport worker, ingress pump and connection watch tasks
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod config;
pub use config::{
    CommunicationOptions, IdentityOptions, DEFAULT_MESSAGE_QUEUE_SIZE, DEFAULT_NAMESPACE,
};

mod control_plane;
mod data_plane;
pub use data_plane::observable::{EventObservable, EventSubscription};

mod error;
pub use error::CommError;

mod event;
pub use event::data::{
    AdvertiseEvent, AssociateEvent, CallEvent, ChannelEvent, CompleteEvent, DeadvertiseEvent,
    DiscoverEvent, EventData, QueryEvent, ResolveEvent, RetrieveEvent, ReturnEvent, UpdateEvent,
};
pub use event::family::{CallFamily, DiscoverFamily, QueryFamily, RequestFamily, UpdateFamily};
pub use event::responder::{IncomingRequest, Responder};
pub use event::{CommunicationEvent, IoState, IoValue, OperatingState, RawMessage};

mod manager;
pub use manager::{CommunicationManager, EventStream};

mod object;
pub use object::{CommObject, CoreType, IoNode};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::event_type::EventType;
pub use routing::topic::{is_valid_event_type_filter, is_valid_namespace, Topic};
pub use routing::topic_filter::{
    is_valid_publication_topic, is_valid_subscription_topic, topic_matches,
};

mod runtime;

mod transport;
pub use transport::{
    ConnectionState, LastWill, Payload, Transport, TransportError, TransportMessage,
};

#[cfg(test)]
mod test_support;
