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

use crate::config::CommunicationOptions;
use crate::control_plane::io_router::IoRouter;
use crate::control_plane::lifecycle::{LifecycleController, LifecycleParts};
use crate::data_plane::dispatcher::{
    advertise_core_type_filter, advertise_object_type_filter, EventDispatcher,
};
use crate::data_plane::ingress_hub::IngressHub;
use crate::data_plane::observable::EventObservable;
use crate::data_plane::outbound_queue::OutboundQueue;
use crate::data_plane::request_correlator::publish_request;
use crate::data_plane::subscription_registry::SubscriptionRegistry;
use crate::error::CommError;
use crate::event::data::{
    AdvertiseEvent, AssociateEvent, CallEvent, ChannelEvent, CompleteEvent, DeadvertiseEvent,
    DiscoverEvent, QueryEvent, ResolveEvent, RetrieveEvent, ReturnEvent, UpdateEvent,
};
use crate::event::family::{CallFamily, DiscoverFamily, QueryFamily, UpdateFamily};
use crate::event::responder::IncomingRequest;
use crate::event::{CommunicationEvent, IoState, IoValue, OperatingState, RawMessage};
use crate::object::{CommObject, CoreType, IoNode};
use crate::routing::event_type::EventType;
use crate::routing::topic::is_valid_event_type_filter;
use crate::runtime::transport_worker::CommandSender;
use crate::transport::{ConnectionState, Payload, Transport};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

/// Stream of decoded one-way events.
pub type EventStream<D> = EventObservable<CommunicationEvent<D>>;

/// Entry point of an agent: owns its identity, the data plane and the IO routing table
/// on top of one [`Transport`].
///
/// `observe_*` calls return lazily activated [`EventObservable`]s; nothing is subscribed
/// until the first [`EventObservable::attach`]. `publish_*` calls made before the
/// transport is online are queued and flushed once it is.
pub struct CommunicationManager {
    options: CommunicationOptions,
    dispatcher: EventDispatcher,
    io_router: Arc<IoRouter>,
    lifecycle: LifecycleController,
}

impl CommunicationManager {
    /// Validates `options` and wires every component. Nothing touches the transport
    /// until [`start`](Self::start).
    pub fn new(
        transport: Arc<dyn Transport>,
        options: CommunicationOptions,
    ) -> Result<Self, CommError> {
        options.validate()?;

        let mut identity = CommObject::new(CoreType::Identity, options.identity.name.clone());
        if let Some(object_id) = options.identity.object_id {
            identity.object_id = object_id;
        }

        let (commands, command_receiver) = CommandSender::channel();
        let registry = Arc::new(SubscriptionRegistry::new(commands.clone()));
        let outbound = Arc::new(OutboundQueue::new(commands.clone()));
        let hub = Arc::new(IngressHub::new(options.message_queue_size));
        let dispatcher = EventDispatcher::new(
            &options.namespace,
            options.enable_cross_namespacing,
            identity.object_id,
            hub,
            registry,
            outbound.clone(),
        );
        let io_router = Arc::new(IoRouter::new(&options.io_nodes, dispatcher.clone()));
        let lifecycle = LifecycleController::new(LifecycleParts {
            transport,
            dispatcher: dispatcher.clone(),
            outbound,
            commands,
            command_receiver,
            io_router: io_router.clone(),
            identity,
            io_nodes: options.io_nodes.clone(),
        });

        Ok(Self {
            options,
            dispatcher,
            io_router,
            lifecycle,
        })
    }

    pub fn options(&self) -> &CommunicationOptions {
        &self.options
    }

    pub fn namespace(&self) -> &str {
        self.dispatcher.namespace()
    }

    pub fn identity(&self) -> &CommObject {
        self.lifecycle.identity()
    }

    /// Connects the transport with a last will deadvertising the identity and IO nodes.
    /// A no-op while started.
    pub async fn start(&self) -> Result<(), CommError> {
        self.lifecycle.start().await
    }

    /// Deadvertises, releases every subscription, ends every live stream and disconnects.
    pub async fn stop(&self) -> Result<(), CommError> {
        self.lifecycle.stop().await
    }

    pub fn operating_state(&self) -> OperatingState {
        self.lifecycle.operating_state()
    }

    /// Replays the current operating state, then every change.
    pub fn observe_operating_state(&self) -> WatchStream<OperatingState> {
        WatchStream::new(self.lifecycle.operating_states())
    }

    /// Replays the current connection state, then every change.
    pub fn observe_communication_state(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.lifecycle.communication_states())
    }

    pub fn observe_advertise_with_core_type(
        &self,
        core_type: CoreType,
    ) -> Result<EventStream<AdvertiseEvent>, CommError> {
        let filter = advertise_core_type_filter(core_type);
        self.dispatcher
            .observe_events(EventType::Advertise, Some(&filter))
    }

    pub fn observe_advertise_with_object_type(
        &self,
        object_type: &str,
    ) -> Result<EventStream<AdvertiseEvent>, CommError> {
        if !is_valid_event_type_filter(object_type) {
            return Err(CommError::invalid_argument(format!(
                "invalid object type {object_type:?}"
            )));
        }
        let filter = advertise_object_type_filter(object_type);
        self.dispatcher
            .observe_events(EventType::Advertise, Some(&filter))
    }

    pub fn publish_advertise(&self, event: AdvertiseEvent) -> Result<(), CommError> {
        self.dispatcher.publish_advertise(&event)
    }

    pub fn observe_deadvertise(&self) -> Result<EventStream<DeadvertiseEvent>, CommError> {
        self.dispatcher.observe_events(EventType::Deadvertise, None)
    }

    pub fn publish_deadvertise(&self, event: DeadvertiseEvent) -> Result<(), CommError> {
        self.dispatcher
            .publish_event(EventType::Deadvertise, None, &event)
    }

    pub fn observe_channel(
        &self,
        channel_id: &str,
    ) -> Result<EventStream<ChannelEvent>, CommError> {
        self.dispatcher
            .observe_events(EventType::Channel, Some(channel_id))
    }

    pub fn publish_channel(&self, channel_id: &str, event: ChannelEvent) -> Result<(), CommError> {
        self.dispatcher
            .publish_event(EventType::Channel, Some(channel_id), &event)
    }

    pub fn observe_discover(
        &self,
    ) -> Result<EventObservable<IncomingRequest<DiscoverFamily>>, CommError> {
        self.dispatcher.observe_requests(None)
    }

    /// Publishes a Discover and returns the stream of Resolves that satisfy it.
    pub fn publish_discover(
        &self,
        event: DiscoverEvent,
    ) -> Result<EventStream<ResolveEvent>, CommError> {
        publish_request::<DiscoverFamily>(&self.dispatcher, None, event)
    }

    /// Update requests for objects of `object_type`.
    pub fn observe_update(
        &self,
        object_type: &str,
    ) -> Result<EventObservable<IncomingRequest<UpdateFamily>>, CommError> {
        self.dispatcher.observe_requests(Some(object_type))
    }

    /// Publishes on the object's type; Completes must carry the same object id.
    pub fn publish_update(
        &self,
        event: UpdateEvent,
    ) -> Result<EventStream<CompleteEvent>, CommError> {
        let object_type = event.object.object_type.clone();
        publish_request::<UpdateFamily>(&self.dispatcher, Some(&object_type), event)
    }

    pub fn observe_query(
        &self,
    ) -> Result<EventObservable<IncomingRequest<QueryFamily>>, CommError> {
        self.dispatcher.observe_requests(None)
    }

    pub fn publish_query(
        &self,
        event: QueryEvent,
    ) -> Result<EventStream<RetrieveEvent>, CommError> {
        publish_request::<QueryFamily>(&self.dispatcher, None, event)
    }

    pub fn observe_call(
        &self,
        operation: &str,
    ) -> Result<EventObservable<IncomingRequest<CallFamily>>, CommError> {
        self.dispatcher.observe_requests(Some(operation))
    }

    pub fn publish_call(
        &self,
        operation: &str,
        event: CallEvent,
    ) -> Result<EventStream<ReturnEvent>, CommError> {
        publish_request::<CallFamily>(&self.dispatcher, Some(operation), event)
    }

    /// Associate events of one IO context, as seen by an IO router.
    pub fn observe_associate(
        &self,
        context: &str,
    ) -> Result<EventStream<AssociateEvent>, CommError> {
        self.dispatcher
            .observe_events(EventType::Associate, Some(context))
    }

    pub fn publish_associate(&self, context: &str, event: AssociateEvent) -> Result<(), CommError> {
        self.dispatcher
            .publish_event(EventType::Associate, Some(context), &event)
    }

    /// Messages on non-protocol topics matching `topic_filter` (`+` and `#` allowed).
    pub fn observe_raw(
        &self,
        topic_filter: &str,
    ) -> Result<EventObservable<RawMessage>, CommError> {
        self.dispatcher.observe_raw(topic_filter)
    }

    pub fn publish_raw(&self, topic: &str, payload: impl Into<Payload>) -> Result<(), CommError> {
        self.dispatcher.publish_raw(topic, payload.into())
    }

    pub fn get_io_node_by_context(&self, context: &str) -> Option<&IoNode> {
        self.options
            .io_nodes
            .iter()
            .find(|io_node| io_node.name == context)
    }

    pub fn create_io_route(&self, io_source: &CommObject) -> Result<String, CommError> {
        self.io_router.create_io_route(io_source)
    }

    pub fn observe_io_state(&self, io_point_id: Uuid) -> Result<WatchStream<IoState>, CommError> {
        self.io_router.observe_io_state(io_point_id)
    }

    pub fn observe_io_value(
        &self,
        io_actor_id: Uuid,
    ) -> Result<EventObservable<IoValue>, CommError> {
        self.io_router.observe_io_value(io_actor_id)
    }

    /// Dropped without error while the source has no association.
    pub fn publish_io_value(&self, io_source_id: Uuid, value: IoValue) -> Result<(), CommError> {
        self.io_router.publish_io_value(io_source_id, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityOptions;
    use crate::test_support::{RecordedCall, RecordingTransport};
    use tokio_stream::StreamExt;

    fn manager(transport: Arc<RecordingTransport>) -> CommunicationManager {
        let options = CommunicationOptions::default()
            .with_namespace("plant")
            .with_identity_name("controller");
        CommunicationManager::new(transport, options).unwrap()
    }

    #[test]
    fn invalid_options_fail_construction() {
        let options = CommunicationOptions::default().with_namespace("a/b");
        assert!(matches!(
            CommunicationManager::new(Arc::new(RecordingTransport::default()), options),
            Err(CommError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn configured_identity_id_is_kept() {
        let object_id = Uuid::new_v4();
        let options = CommunicationOptions {
            identity: IdentityOptions {
                name: "fixed".to_string(),
                object_id: Some(object_id),
            },
            ..CommunicationOptions::default()
        };
        let manager =
            CommunicationManager::new(Arc::new(RecordingTransport::default()), options).unwrap();

        assert_eq!(manager.identity().object_id, object_id);
        assert_eq!(manager.identity().core_type, CoreType::Identity);
    }

    #[test]
    fn reserved_characters_are_rejected_synchronously() {
        let manager = manager(Arc::new(RecordingTransport::default()));

        assert!(matches!(
            manager.observe_channel("a/b"),
            Err(CommError::InvalidArgument(_))
        ));
        assert!(manager.observe_call("op+").is_err());
        assert!(manager.observe_advertise_with_object_type("").is_err());
        assert!(manager.publish_raw("v1/plant/x", "1").is_err());
    }

    #[tokio::test]
    async fn lifecycle_states_are_observable() {
        let transport = Arc::new(RecordingTransport::default());
        let manager = manager(transport.clone());
        let mut states = manager.observe_operating_state();
        assert_eq!(states.next().await, Some(OperatingState::Stopped));

        manager.start().await.unwrap();
        assert_eq!(manager.operating_state(), OperatingState::Started);
        manager.start().await.unwrap();
        assert_eq!(
            transport.count(|call| matches!(call, RecordedCall::Connect(_))),
            1
        );

        manager.stop().await.unwrap();
        assert_eq!(manager.operating_state(), OperatingState::Stopped);
        assert_eq!(
            transport.count(|call| matches!(call, RecordedCall::Disconnect)),
            1
        );
    }

    #[test]
    fn io_nodes_are_found_by_context() {
        let node = IoNode::new("lighting");
        let options = CommunicationOptions::default().with_io_node(node.clone());
        let manager =
            CommunicationManager::new(Arc::new(RecordingTransport::default()), options).unwrap();

        assert_eq!(manager.get_io_node_by_context("lighting"), Some(&node));
        assert!(manager.get_io_node_by_context("climate").is_none());
    }
}
