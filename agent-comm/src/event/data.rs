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

//! Payloads carried by each event type.

use crate::object::{CommObject, CoreType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use uuid::Uuid;

/// Serializable event payload with its own structural checks.
///
/// `validate` runs on every outgoing payload before publishing and on every incoming
/// payload after decoding; a failing incoming payload is skipped.
pub trait EventData: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiseEvent {
    pub object: CommObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_data: Option<Value>,
}

impl AdvertiseEvent {
    pub fn new(object: CommObject) -> Self {
        Self {
            object,
            private_data: None,
        }
    }
}

impl EventData for AdvertiseEvent {}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadvertiseEvent {
    pub object_ids: Vec<Uuid>,
}

impl EventData for DeadvertiseEvent {
    fn validate(&self) -> Result<(), String> {
        if self.object_ids.is_empty() {
            return Err("deadvertise requires at least one object id".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<CommObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<CommObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_data: Option<Value>,
}

impl ChannelEvent {
    pub fn with_object(object: CommObject) -> Self {
        Self {
            object: Some(object),
            objects: None,
            private_data: None,
        }
    }

    pub fn with_objects(objects: Vec<CommObject>) -> Self {
        Self {
            object: None,
            objects: Some(objects),
            private_data: None,
        }
    }
}

impl EventData for ChannelEvent {
    fn validate(&self) -> Result<(), String> {
        match (&self.object, &self.objects) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err("channel requires exactly one of object or objects".to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_types: Option<Vec<CoreType>>,
}

impl DiscoverEvent {
    pub fn with_object_id(object_id: Uuid) -> Self {
        Self {
            object_id: Some(object_id),
            ..Self::default()
        }
    }

    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }

    pub fn with_core_types(core_types: Vec<CoreType>) -> Self {
        Self {
            core_types: Some(core_types),
            ..Self::default()
        }
    }

    pub fn with_object_types(object_types: Vec<String>) -> Self {
        Self {
            object_types: Some(object_types),
            ..Self::default()
        }
    }

    /// True when the object satisfies every criterion this discover sets.
    pub fn matches(&self, object: &CommObject) -> bool {
        self.object_id.map_or(true, |id| id == object.object_id)
            && self
                .external_id
                .as_ref()
                .map_or(true, |id| object.external_id.as_ref() == Some(id))
            && self
                .object_types
                .as_ref()
                .map_or(true, |types| types.contains(&object.object_type))
            && self
                .core_types
                .as_ref()
                .map_or(true, |types| types.contains(&object.core_type))
    }
}

impl EventData for DiscoverEvent {
    fn validate(&self) -> Result<(), String> {
        if self.object_types.is_some() && self.core_types.is_some() {
            return Err("discover takes object types or core types, not both".to_string());
        }
        if self.external_id.is_none()
            && self.object_id.is_none()
            && self.object_types.is_none()
            && self.core_types.is_none()
        {
            return Err("discover requires at least one criterion".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<CommObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_objects: Option<Vec<CommObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_data: Option<Value>,
}

impl ResolveEvent {
    pub fn with_object(object: CommObject) -> Self {
        Self {
            object: Some(object),
            related_objects: None,
            private_data: None,
        }
    }
}

impl EventData for ResolveEvent {
    fn validate(&self) -> Result<(), String> {
        if self.object.is_none() && self.related_objects.is_none() {
            return Err("resolve requires an object or related objects".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub object: CommObject,
}

impl EventData for UpdateEvent {}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvent {
    pub object: CommObject,
}

impl EventData for CompleteEvent {}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_types: Option<Vec<CoreType>>,
    /// Declarative predicate evaluated by the responder's filter engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_filter: Option<Value>,
}

impl QueryEvent {
    pub fn with_core_types(core_types: Vec<CoreType>) -> Self {
        Self {
            core_types: Some(core_types),
            ..Self::default()
        }
    }

    pub fn with_object_types(object_types: Vec<String>) -> Self {
        Self {
            object_types: Some(object_types),
            ..Self::default()
        }
    }

    pub fn matches_type(&self, object: &CommObject) -> bool {
        match (&self.object_types, &self.core_types) {
            (Some(types), _) => types.contains(&object.object_type),
            (None, Some(types)) => types.contains(&object.core_type),
            (None, None) => true,
        }
    }
}

impl EventData for QueryEvent {
    fn validate(&self) -> Result<(), String> {
        match (&self.object_types, &self.core_types) {
            (Some(_), Some(_)) => Err("query takes object types or core types, not both".into()),
            (None, None) => Err("query requires object types or core types".into()),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveEvent {
    pub objects: Vec<CommObject>,
}

impl EventData for RetrieveEvent {}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Context filter the callee evaluates before executing the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl CallEvent {
    pub fn with_parameters(parameters: Value) -> Self {
        Self {
            parameters: Some(parameters),
            filter: None,
        }
    }
}

impl EventData for CallEvent {}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_info: Option<Value>,
}

impl ReturnEvent {
    pub fn with_result(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn with_error(error: Value) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

impl EventData for ReturnEvent {
    fn validate(&self) -> Result<(), String> {
        match (&self.result, &self.error) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err("return requires exactly one of result or error".to_string()),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateEvent {
    pub io_source_id: Uuid,
    pub io_actor_id: Uuid,
    /// Route connecting source and actor; absent for a disassociation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associating_route: Option<String>,
    #[serde(default)]
    pub is_external_route: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rate: Option<u64>,
}

impl AssociateEvent {
    pub fn associate(io_source_id: Uuid, io_actor_id: Uuid, route: impl Into<String>) -> Self {
        Self {
            io_source_id,
            io_actor_id,
            associating_route: Some(route.into()),
            is_external_route: false,
            update_rate: None,
        }
    }

    pub fn disassociate(io_source_id: Uuid, io_actor_id: Uuid) -> Self {
        Self {
            io_source_id,
            io_actor_id,
            associating_route: None,
            is_external_route: false,
            update_rate: None,
        }
    }

    pub fn with_update_rate(mut self, update_rate: u64) -> Self {
        self.update_rate = Some(update_rate);
        self
    }
}

impl EventData for AssociateEvent {
    fn validate(&self) -> Result<(), String> {
        match &self.associating_route {
            Some(route) if route.is_empty() => Err("associating route must not be empty".into()),
            None if self.is_external_route => {
                Err("external route flag requires an associating route".into())
            }
            _ => Ok(()),
        }
    }
}
