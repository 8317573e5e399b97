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

//! Event dispatch: builds topics for outgoing events and decoding streams for
//! incoming ones.

use crate::data_plane::ingress_hub::{InboundMessage, IngressHub};
use crate::data_plane::observable::{Decoder, EventObservable};
use crate::data_plane::outbound_queue::OutboundQueue;
use crate::data_plane::subscription_registry::SubscriptionRegistry;
use crate::error::CommError;
use crate::event::data::{AdvertiseEvent, EventData};
use crate::event::family::RequestFamily;
use crate::event::responder::{IncomingRequest, Responder};
use crate::event::{decode_payload, encode_payload, CommunicationEvent, RawMessage};
use crate::object::CoreType;
use crate::observability::{events, fields};
use crate::routing::event_type::EventType;
use crate::routing::topic::{
    is_valid_event_type_filter, subscription_topic, Topic, FILTER_SEPARATOR,
};
use crate::routing::topic_filter::{
    is_protocol_topic, is_valid_publication_topic, is_valid_subscription_topic, topic_matches,
};
use crate::transport::Payload;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const COMPONENT: &str = "dispatcher";

pub(crate) fn advertise_core_type_filter(core_type: CoreType) -> String {
    core_type.name().to_string()
}

/// Canonical object types map onto their core-type filter; any other type is marked
/// by a leading separator.
pub(crate) fn advertise_object_type_filter(object_type: &str) -> String {
    CoreType::ALL
        .iter()
        .find(|core_type| core_type.canonical_object_type() == object_type)
        .map(|core_type| advertise_core_type_filter(*core_type))
        .unwrap_or_else(|| format!("{FILTER_SEPARATOR}{object_type}"))
}

/// Shared handle over the data plane, cheap to clone into decoders and responders.
#[derive(Clone)]
pub(crate) struct EventDispatcher {
    namespace: Arc<str>,
    cross_namespacing: bool,
    source_id: Uuid,
    hub: Arc<IngressHub>,
    registry: Arc<SubscriptionRegistry>,
    outbound: Arc<OutboundQueue>,
}

impl EventDispatcher {
    pub(crate) fn new(
        namespace: &str,
        cross_namespacing: bool,
        source_id: Uuid,
        hub: Arc<IngressHub>,
        registry: Arc<SubscriptionRegistry>,
        outbound: Arc<OutboundQueue>,
    ) -> Self {
        Self {
            namespace: Arc::from(namespace),
            cross_namespacing,
            source_id,
            hub,
            registry,
            outbound,
        }
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn source_id(&self) -> Uuid {
        self.source_id
    }

    pub(crate) fn hub(&self) -> &Arc<IngressHub> {
        &self.hub
    }

    pub(crate) fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Namespace level of subscription topics; `None` subscribes across namespaces.
    fn subscription_namespace(&self) -> Option<&str> {
        (!self.cross_namespacing).then_some(self.namespace())
    }

    fn accepts_namespace(&self, topic: &Topic) -> bool {
        self.cross_namespacing || topic.namespace == *self.namespace
    }

    /// Structured topic of an incoming message if it is `event_type` with `filter`
    /// in an accepted namespace.
    fn structured_match<'m>(
        &self,
        message: &'m InboundMessage,
        event_type: EventType,
        filter: Option<&str>,
    ) -> Option<&'m Topic> {
        message.structured.as_ref().filter(|topic| {
            topic.event_type == event_type
                && topic.event_type_filter.as_deref() == filter
                && self.accepts_namespace(topic)
        })
    }

    /// Hands an already validated topic to the outbound queue.
    pub(crate) fn enqueue(&self, topic: String, payload: Payload) {
        self.outbound.publish(topic, payload);
    }

    pub(crate) fn publish_encoded(&self, topic: &Topic, payload: Payload) -> Result<(), CommError> {
        self.enqueue(topic.encode()?, payload);
        Ok(())
    }

    /// Publishes a one-way event from this agent's identity.
    pub(crate) fn publish_event<D: EventData>(
        &self,
        event_type: EventType,
        filter: Option<&str>,
        data: &D,
    ) -> Result<(), CommError> {
        let topic = Topic::one_way(self.namespace(), event_type, filter, self.source_id);
        let encoded = topic.encode()?;
        let payload = encode_payload(data)?;
        self.enqueue(encoded, payload);
        Ok(())
    }

    /// Publishes on the core-type filter, and also on the object-type filter when the
    /// object type is not the canonical one of its core type.
    pub(crate) fn publish_advertise(&self, event: &AdvertiseEvent) -> Result<(), CommError> {
        let object = &event.object;
        if !is_valid_event_type_filter(&object.object_type) {
            return Err(CommError::invalid_argument(format!(
                "invalid object type {:?}",
                object.object_type
            )));
        }
        let mut filters = vec![advertise_core_type_filter(object.core_type)];
        if !object.has_canonical_object_type() {
            filters.push(advertise_object_type_filter(&object.object_type));
        }
        let topics = filters
            .iter()
            .map(|filter| {
                Topic::one_way(
                    self.namespace(),
                    EventType::Advertise,
                    Some(filter),
                    self.source_id,
                )
                .encode()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let payload = encode_payload(event)?;
        for topic in topics {
            self.enqueue(topic, payload.clone());
        }
        Ok(())
    }

    /// Stream of one-way events of one type and filter.
    pub(crate) fn observe_events<D: EventData>(
        &self,
        event_type: EventType,
        filter: Option<&str>,
    ) -> Result<EventObservable<CommunicationEvent<D>>, CommError> {
        let topic = subscription_topic(self.subscription_namespace(), event_type, filter, None)?;
        let dispatcher = self.clone();
        let filter = filter.map(str::to_string);
        let decoder: Decoder<CommunicationEvent<D>> = Arc::new(move |message: &InboundMessage| {
            let topic = dispatcher.structured_match(message, event_type, filter.as_deref())?;
            decode_or_skip::<D>(message, topic)
                .map(|data| CommunicationEvent::from_topic(topic, data))
        });
        Ok(EventObservable::lazy(
            topic,
            self.hub.clone(),
            self.registry.clone(),
            decoder,
        ))
    }

    /// Stream of incoming requests of family `F`, each paired with a one-shot responder.
    pub(crate) fn observe_requests<F: RequestFamily>(
        &self,
        filter: Option<&str>,
    ) -> Result<EventObservable<IncomingRequest<F>>, CommError> {
        let topic = subscription_topic(self.subscription_namespace(), F::REQUEST, filter, None)?;
        let dispatcher = self.clone();
        let filter = filter.map(str::to_string);
        let decoder: Decoder<IncomingRequest<F>> = Arc::new(move |message: &InboundMessage| {
            let topic = dispatcher.structured_match(message, F::REQUEST, filter.as_deref())?;
            let correlation_id = topic.correlation_id.clone()?;
            let data = decode_or_skip::<F::Request>(message, topic)?;
            let responder = Responder::new(
                dispatcher.clone(),
                topic.namespace.clone(),
                correlation_id,
                data.clone(),
            );
            Some(IncomingRequest::new(
                CommunicationEvent::from_topic(topic, data),
                responder,
            ))
        });
        Ok(EventObservable::lazy(
            topic,
            self.hub.clone(),
            self.registry.clone(),
            decoder,
        ))
    }

    pub(crate) fn observe_raw(
        &self,
        topic_filter: &str,
    ) -> Result<EventObservable<RawMessage>, CommError> {
        if !is_valid_subscription_topic(topic_filter) || is_protocol_topic(topic_filter) {
            return Err(CommError::invalid_argument(format!(
                "invalid raw subscription topic {topic_filter:?}"
            )));
        }
        let filter = topic_filter.to_string();
        let decoder: Decoder<RawMessage> = Arc::new(move |message: &InboundMessage| {
            (message.structured.is_none() && topic_matches(&message.topic, &filter)).then(|| {
                RawMessage {
                    topic: message.topic.clone(),
                    payload: message.payload.clone(),
                }
            })
        });
        Ok(EventObservable::lazy(
            topic_filter.to_string(),
            self.hub.clone(),
            self.registry.clone(),
            decoder,
        ))
    }

    pub(crate) fn publish_raw(&self, topic: &str, payload: Payload) -> Result<(), CommError> {
        if !is_valid_publication_topic(topic) || is_protocol_topic(topic) {
            return Err(CommError::invalid_argument(format!(
                "invalid raw publication topic {topic:?}"
            )));
        }
        self.enqueue(topic.to_string(), payload);
        Ok(())
    }
}

/// Decodes the payload, logging and skipping the message on failure.
pub(crate) fn decode_or_skip<D: EventData>(message: &InboundMessage, topic: &Topic) -> Option<D> {
    match decode_payload::<D>(&message.payload) {
        Ok(data) => Some(data),
        Err(err) => {
            warn!(
                event = events::DISPATCH_DECODE_FAILED,
                component = COMPONENT,
                topic = message.topic.as_str(),
                source_id = %topic.source_id,
                correlation_id = %fields::format_optional_str(topic.correlation_id.as_deref()),
                err = %err,
                "skipping undecodable event"
            );
            None
        }
    }
}
