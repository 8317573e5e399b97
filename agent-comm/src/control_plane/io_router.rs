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

//! Owner of the IO routing table, its route subscriptions and IO-state streams.

use crate::control_plane::io_route_table::{IoRouteTable, RouteChanges};
use crate::data_plane::dispatcher::EventDispatcher;
use crate::data_plane::ingress_hub::InboundMessage;
use crate::data_plane::observable::{Decoder, EventObservable};
use crate::data_plane::subscription_registry::SubscriptionLease;
use crate::error::CommError;
use crate::event::data::AssociateEvent;
use crate::event::{IoState, IoValue};
use crate::object::{CommObject, CoreType, IoNode};
use crate::observability::{events, fields};
use crate::routing::event_type::EventType;
use crate::routing::topic::Topic;
use crate::routing::topic_filter::{is_protocol_topic, is_valid_publication_topic};
use crate::transport::Payload;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "io_router";

struct LocalPoint {
    object: CommObject,
    context: String,
}

struct RouterState {
    table: IoRouteTable,
    route_leases: HashMap<String, SubscriptionLease>,
    io_states: HashMap<Uuid, watch::Sender<IoState>>,
}

pub(crate) struct IoRouter {
    dispatcher: EventDispatcher,
    points: HashMap<Uuid, LocalPoint>,
    state: Mutex<RouterState>,
}

impl IoRouter {
    pub(crate) fn new(io_nodes: &[IoNode], dispatcher: EventDispatcher) -> Self {
        let mut points = HashMap::new();
        let mut sources = HashSet::new();
        let mut actors = HashSet::new();
        for io_node in io_nodes {
            for source in &io_node.io_sources {
                sources.insert(source.object_id);
                points.insert(
                    source.object_id,
                    LocalPoint {
                        object: source.clone(),
                        context: io_node.name.clone(),
                    },
                );
            }
            for actor in &io_node.io_actors {
                actors.insert(actor.object_id);
                points.insert(
                    actor.object_id,
                    LocalPoint {
                        object: actor.clone(),
                        context: io_node.name.clone(),
                    },
                );
            }
        }
        let io_states = points
            .keys()
            .map(|id| (*id, watch::channel(IoState::default()).0))
            .collect();

        Self {
            dispatcher,
            points,
            state: Mutex::new(RouterState {
                table: IoRouteTable::new(sources, actors),
                route_leases: HashMap::new(),
                io_states,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn owns(&self, point: Uuid, core_type: CoreType, context: &str) -> bool {
        self.points
            .get(&point)
            .is_some_and(|local| local.object.core_type == core_type && local.context == context)
    }

    fn local_point(&self, point: Uuid, core_type: CoreType) -> Result<&CommObject, CommError> {
        self.points
            .get(&point)
            .map(|local| &local.object)
            .filter(|object| object.core_type == core_type)
            .ok_or_else(|| {
                CommError::invalid_argument(format!("{point} is not a local {core_type}"))
            })
    }

    /// Applies an Associate event received on the IO context `context`.
    pub(crate) fn handle_associate(&self, context: &str, event: &AssociateEvent) {
        if let Some(route) = &event.associating_route {
            if !is_valid_publication_topic(route) {
                warn!(
                    event = events::IO_ASSOCIATE_IGNORED,
                    component = COMPONENT,
                    route = route.as_str(),
                    reason = "invalid_route",
                    "ignoring associate with unusable route"
                );
                return;
            }
        }
        let owns_source = self.owns(event.io_source_id, CoreType::IoSource, context);
        let owns_actor = self.owns(event.io_actor_id, CoreType::IoActor, context);

        let mut state = self.lock();
        let Some(changes) = state.table.apply(event, owns_source, owns_actor) else {
            debug!(
                event = events::IO_ASSOCIATE_IGNORED,
                component = COMPONENT,
                io_source_id = %event.io_source_id,
                io_actor_id = %event.io_actor_id,
                reason = fields::REASON_NOT_OWNED,
                "associate addresses no local IO point"
            );
            return;
        };

        if owns_source {
            let route = event.associating_route.as_deref();
            debug!(
                event = if route.is_some() {
                    events::IO_SOURCE_ROUTE_CHANGED
                } else {
                    events::IO_SOURCE_DISASSOCIATED
                },
                component = COMPONENT,
                io_source_id = %event.io_source_id,
                io_actor_id = %event.io_actor_id,
                route = %fields::format_optional_str(route),
                "IO source association updated"
            );
        }
        if owns_actor {
            debug!(
                event = if event.associating_route.is_some() {
                    events::IO_ACTOR_ASSOCIATED
                } else {
                    events::IO_ACTOR_DISASSOCIATED
                },
                component = COMPONENT,
                io_source_id = %event.io_source_id,
                io_actor_id = %event.io_actor_id,
                "IO actor association updated"
            );
        }
        self.apply_changes(&mut state, changes);
    }

    fn apply_changes(&self, state: &mut RouterState, changes: RouteChanges) {
        for route in &changes.released_routes {
            state.route_leases.remove(route);
        }
        for route in changes.subscribed_routes {
            let lease = self.dispatcher.registry().acquire(&route);
            state.route_leases.insert(route, lease);
        }
        for point in changes.affected_points {
            let io_state = state.table.io_state(point);
            if let Some(sender) = state.io_states.get(&point) {
                sender.send_replace(io_state);
            }
        }
    }

    /// Route topic for `io_source`: its external route if set, else its IoValue topic.
    pub(crate) fn create_io_route(&self, io_source: &CommObject) -> Result<String, CommError> {
        if io_source.core_type != CoreType::IoSource {
            return Err(CommError::invalid_argument(format!(
                "{} is not an IO source",
                io_source.object_id
            )));
        }
        if let Some(route) = &io_source.external_route {
            if !is_valid_publication_topic(route) || is_protocol_topic(route) {
                return Err(CommError::invalid_argument(format!(
                    "invalid external route {route:?}"
                )));
            }
            return Ok(route.clone());
        }
        Topic::one_way(
            self.dispatcher.namespace(),
            EventType::IoValue,
            None,
            io_source.object_id,
        )
        .encode()
    }

    /// Publishes on the source's current route; silently dropped while unassociated.
    pub(crate) fn publish_io_value(
        &self,
        source_id: Uuid,
        value: IoValue,
    ) -> Result<(), CommError> {
        let source = self.local_point(source_id, CoreType::IoSource)?;
        let payload = encode_io_value(source, value)?;
        let route = self
            .lock()
            .table
            .source_route(source_id)
            .map(|entry| entry.route.clone());
        match route {
            Some(route) => self.dispatcher.enqueue(route, payload),
            None => debug!(
                event = events::IO_VALUE_DROPPED,
                component = COMPONENT,
                io_source_id = %source_id,
                reason = fields::REASON_NOT_ASSOCIATED,
                "IO source unassociated; value dropped"
            ),
        }
        Ok(())
    }

    /// Values arriving on any route the actor is currently associated with.
    pub(crate) fn observe_io_value(
        self: &Arc<Self>,
        actor_id: Uuid,
    ) -> Result<EventObservable<IoValue>, CommError> {
        let actor = self.local_point(actor_id, CoreType::IoActor)?;
        let raw = actor.uses_raw_io_values();
        let router = Arc::clone(self);
        let decoder: Decoder<IoValue> = Arc::new(move |message: &InboundMessage| {
            if !router.lock().table.actor_has_route(actor_id, &message.topic) {
                return None;
            }
            decode_io_value(raw, message)
        });
        Ok(EventObservable::unmanaged(
            format!("io_value:{actor_id}"),
            self.dispatcher.hub().clone(),
            self.dispatcher.registry().clone(),
            decoder,
        ))
    }

    /// Replay-one stream of a local IO point's association state.
    pub(crate) fn observe_io_state(&self, point: Uuid) -> Result<WatchStream<IoState>, CommError> {
        let state = self.lock();
        let sender = state.io_states.get(&point).ok_or_else(|| {
            CommError::invalid_argument(format!("{point} is not a local IO point"))
        })?;
        Ok(WatchStream::new(sender.subscribe()))
    }

    #[cfg(test)]
    pub(crate) fn io_state(&self, point: Uuid) -> Option<IoState> {
        self.lock()
            .io_states
            .get(&point)
            .map(|sender| *sender.borrow())
    }

    /// Pushes a final unassociated state to every IO-state stream, closes them and
    /// releases every route subscription.
    pub(crate) fn teardown(&self) {
        let mut state = self.lock();
        let changes = state.table.clear();
        self.apply_changes(&mut state, changes);
        state.route_leases.clear();
        for sender in state.io_states.values_mut() {
            sender.send_replace(IoState::default());
            *sender = watch::channel(IoState::default()).0;
        }
    }
}

fn encode_io_value(source: &CommObject, value: IoValue) -> Result<Payload, CommError> {
    match (source.uses_raw_io_values(), value) {
        (true, IoValue::Raw(bytes)) => Ok(Payload::Binary(bytes)),
        (false, IoValue::Json(value)) => serde_json::to_string(&value)
            .map(Payload::Text)
            .map_err(|err| CommError::invalid_argument(format!("unserializable IO value: {err}"))),
        (true, IoValue::Json(_)) => Err(CommError::invalid_argument(format!(
            "IO source {} expects raw values",
            source.object_id
        ))),
        (false, IoValue::Raw(_)) => Err(CommError::invalid_argument(format!(
            "IO source {} expects JSON values",
            source.object_id
        ))),
    }
}

fn decode_io_value(raw: bool, message: &InboundMessage) -> Option<IoValue> {
    if raw {
        return Some(IoValue::Raw(message.payload.as_bytes().to_vec()));
    }
    match serde_json::from_slice(message.payload.as_bytes()) {
        Ok(value) => Some(IoValue::Json(value)),
        Err(err) => {
            warn!(
                event = events::DISPATCH_DECODE_FAILED,
                component = COMPONENT,
                topic = message.topic.as_str(),
                err = %err,
                "skipping undecodable IO value"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_plane::dispatcher::tests::{dispatcher, inbound};
    use crate::runtime::transport_worker::TransportCommand;
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_stream::StreamExt;

    struct Fixture {
        router: Arc<IoRouter>,
        commands: UnboundedReceiver<TransportCommand>,
        source: CommObject,
        actors: [CommObject; 3],
    }

    fn fixture() -> Fixture {
        let (dispatcher, commands) = dispatcher(false);
        let source = CommObject::io_source("dimmer", "plant.Percent");
        let actors = [
            CommObject::io_actor("lamp-a", "plant.Percent"),
            CommObject::io_actor("lamp-b", "plant.Percent"),
            CommObject::io_actor("lamp-c", "plant.Percent"),
        ];
        let mut node = IoNode::new("lighting").with_source(source.clone());
        for actor in &actors {
            node = node.with_actor(actor.clone());
        }
        Fixture {
            router: Arc::new(IoRouter::new(&[node], dispatcher)),
            commands,
            source,
            actors,
        }
    }

    fn drain(commands: &mut UnboundedReceiver<TransportCommand>) -> Vec<TransportCommand> {
        std::iter::from_fn(|| commands.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn reassociation_cascades_states_and_subscriptions() {
        let mut fixture = fixture();
        let [a, b, c] = fixture.actors.clone();
        let router = &fixture.router;
        let source = fixture.source.object_id;

        router.handle_associate("lighting", &AssociateEvent::associate(source, a.object_id, "r1"));
        router.handle_associate("lighting", &AssociateEvent::associate(source, b.object_id, "r1"));
        assert_eq!(
            drain(&mut fixture.commands),
            vec![TransportCommand::Subscribe("r1".to_string())]
        );
        let mut a_states = router.observe_io_state(a.object_id).unwrap();
        assert!(a_states.next().await.unwrap().has_associations);

        router.handle_associate("lighting", &AssociateEvent::associate(source, c.object_id, "r2"));

        assert_eq!(
            drain(&mut fixture.commands),
            vec![
                TransportCommand::Unsubscribe("r1".to_string()),
                TransportCommand::Subscribe("r2".to_string()),
            ]
        );
        assert!(!a_states.next().await.unwrap().has_associations);
        assert_eq!(router.io_state(b.object_id).map(|s| s.has_associations), Some(false));
        assert_eq!(router.io_state(c.object_id).map(|s| s.has_associations), Some(true));
    }

    #[test]
    fn events_for_other_contexts_are_ignored() {
        let mut fixture = fixture();
        let source = fixture.source.object_id;
        let actor = fixture.actors[0].object_id;

        fixture
            .router
            .handle_associate("climate", &AssociateEvent::associate(source, actor, "r1"));

        assert!(drain(&mut fixture.commands).is_empty());
        assert_eq!(fixture.router.io_state(actor), Some(IoState::default()));
    }

    #[test]
    fn io_values_follow_the_current_route() {
        let mut fixture = fixture();
        let source = fixture.source.object_id;
        let actor = fixture.actors[0].object_id;

        fixture
            .router
            .publish_io_value(source, IoValue::Json(json!(10)))
            .unwrap();
        assert!(drain(&mut fixture.commands).is_empty());

        fixture
            .router
            .handle_associate("lighting", &AssociateEvent::associate(source, actor, "r1"));
        drain(&mut fixture.commands);
        fixture
            .router
            .publish_io_value(source, IoValue::Json(json!(42)))
            .unwrap();

        assert_eq!(
            drain(&mut fixture.commands),
            vec![TransportCommand::Publish(crate::transport::TransportMessage::new(
                "r1", "42"
            ))]
        );
        assert!(fixture
            .router
            .publish_io_value(source, IoValue::Raw(vec![1]))
            .is_err());
        assert!(fixture
            .router
            .publish_io_value(actor, IoValue::Json(json!(1)))
            .is_err());
    }

    #[tokio::test]
    async fn actors_receive_values_only_on_associated_routes() {
        let fixture = fixture();
        let source = fixture.source.object_id;
        let actor = fixture.actors[0].object_id;
        let mut values = fixture.router.observe_io_value(actor).unwrap().attach().unwrap();

        fixture
            .router
            .handle_associate("lighting", &AssociateEvent::associate(source, actor, "r1"));
        let hub = fixture.router.dispatcher.hub().clone();
        hub.dispatch(inbound("r2", "1"));
        hub.dispatch(inbound("r1", "not json"));
        hub.dispatch(inbound("r1", "7"));

        assert_eq!(values.next().await, Some(IoValue::Json(json!(7))));
    }

    #[tokio::test]
    async fn teardown_pushes_final_state_and_closes_streams() {
        let mut fixture = fixture();
        let source = fixture.source.object_id;
        let actor = fixture.actors[0].object_id;
        fixture
            .router
            .handle_associate("lighting", &AssociateEvent::associate(source, actor, "r1"));
        let mut states = fixture.router.observe_io_state(source).unwrap();
        assert!(states.next().await.unwrap().has_associations);
        drain(&mut fixture.commands);

        fixture.router.teardown();

        assert_eq!(states.next().await, Some(IoState::default()));
        assert_eq!(states.next().await, None);
        assert_eq!(
            drain(&mut fixture.commands),
            vec![TransportCommand::Unsubscribe("r1".to_string())]
        );
    }

    #[test]
    fn create_io_route_prefers_external_route() {
        let fixture = fixture();
        let route = fixture.router.create_io_route(&fixture.source).unwrap();
        assert_eq!(route, format!("v1/plant/IOV/{}", fixture.source.object_id));

        let mut external = fixture.source.clone();
        external.external_route = Some("plant/dimmer".to_string());
        assert_eq!(
            fixture.router.create_io_route(&external).unwrap(),
            "plant/dimmer"
        );

        assert!(fixture.router.create_io_route(&fixture.actors[0]).is_err());
    }
}
