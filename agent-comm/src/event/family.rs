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

//! Request/response event families.

use crate::event::data::{
    CallEvent, CompleteEvent, DiscoverEvent, EventData, QueryEvent, ResolveEvent, RetrieveEvent,
    ReturnEvent, UpdateEvent,
};
use crate::routing::event_type::EventType;

/// Pairs a request event type with its response event type.
pub trait RequestFamily: Send + Sync + 'static {
    type Request: EventData;
    type Response: EventData;

    const REQUEST: EventType;
    const RESPONSE: EventType;

    /// Whether `response` is an acceptable answer to `request`.
    fn accepts(request: &Self::Request, response: &Self::Response) -> bool;
}

#[derive(Clone, Copy, Debug)]
pub struct DiscoverFamily;

impl RequestFamily for DiscoverFamily {
    type Request = DiscoverEvent;
    type Response = ResolveEvent;

    const REQUEST: EventType = EventType::Discover;
    const RESPONSE: EventType = EventType::Resolve;

    fn accepts(request: &DiscoverEvent, response: &ResolveEvent) -> bool {
        response
            .object
            .as_ref()
            .map_or(true, |object| request.matches(object))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct UpdateFamily;

impl RequestFamily for UpdateFamily {
    type Request = UpdateEvent;
    type Response = CompleteEvent;

    const REQUEST: EventType = EventType::Update;
    const RESPONSE: EventType = EventType::Complete;

    fn accepts(request: &UpdateEvent, response: &CompleteEvent) -> bool {
        request.object.object_id == response.object.object_id
    }
}

#[derive(Clone, Copy, Debug)]
pub struct QueryFamily;

impl RequestFamily for QueryFamily {
    type Request = QueryEvent;
    type Response = RetrieveEvent;

    const REQUEST: EventType = EventType::Query;
    const RESPONSE: EventType = EventType::Retrieve;

    fn accepts(request: &QueryEvent, response: &RetrieveEvent) -> bool {
        response
            .objects
            .iter()
            .all(|object| request.matches_type(object))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CallFamily;

impl RequestFamily for CallFamily {
    type Request = CallEvent;
    type Response = ReturnEvent;

    const REQUEST: EventType = EventType::Call;
    const RESPONSE: EventType = EventType::Return;

    fn accepts(_request: &CallEvent, _response: &ReturnEvent) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{CommObject, CoreType};

    fn assert_pairing<F: RequestFamily>() {
        assert_eq!(F::REQUEST.response_type(), Some(F::RESPONSE));
    }

    #[test]
    fn families_pair_matching_event_types() {
        assert_pairing::<DiscoverFamily>();
        assert_pairing::<UpdateFamily>();
        assert_pairing::<QueryFamily>();
        assert_pairing::<CallFamily>();
    }

    #[test]
    fn resolve_must_satisfy_discover_criteria() {
        let log = CommObject::new(CoreType::Log, "boot");
        let discover = DiscoverEvent::with_object_id(log.object_id);

        assert!(DiscoverFamily::accepts(
            &discover,
            &ResolveEvent::with_object(log.clone())
        ));
        assert!(!DiscoverFamily::accepts(
            &discover,
            &ResolveEvent::with_object(CommObject::new(CoreType::Log, "other"))
        ));

        let related_only = ResolveEvent {
            object: None,
            related_objects: Some(vec![log]),
            private_data: None,
        };
        assert!(DiscoverFamily::accepts(&discover, &related_only));
    }

    #[test]
    fn complete_must_echo_updated_object() {
        let task = CommObject::new(CoreType::Task, "calibrate");
        let update = UpdateEvent {
            object: task.clone(),
        };

        assert!(UpdateFamily::accepts(&update, &CompleteEvent { object: task }));
        assert!(!UpdateFamily::accepts(
            &update,
            &CompleteEvent {
                object: CommObject::new(CoreType::Task, "other")
            }
        ));
    }

    #[test]
    fn retrieve_objects_must_match_query_types() {
        let query = QueryEvent::with_core_types(vec![CoreType::Log]);
        let logs = RetrieveEvent {
            objects: vec![CommObject::new(CoreType::Log, "a")],
        };
        let mixed = RetrieveEvent {
            objects: vec![
                CommObject::new(CoreType::Log, "a"),
                CommObject::new(CoreType::Task, "b"),
            ],
        };

        assert!(QueryFamily::accepts(&query, &logs));
        assert!(!QueryFamily::accepts(&query, &mixed));
    }
}
