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

//! Domain objects exchanged between agents.
//!
//! A closed family of core types plus an open `object_type` string. Fields the core
//! does not know about travel untouched in [`CommObject::custom`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CoreType {
    Object,
    Identity,
    IoNode,
    IoSource,
    IoActor,
    Log,
    Task,
    User,
    Annotation,
    Snapshot,
}

impl CoreType {
    pub const ALL: [CoreType; 10] = [
        CoreType::Object,
        CoreType::Identity,
        CoreType::IoNode,
        CoreType::IoSource,
        CoreType::IoActor,
        CoreType::Log,
        CoreType::Task,
        CoreType::User,
        CoreType::Annotation,
        CoreType::Snapshot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CoreType::Object => "Object",
            CoreType::Identity => "Identity",
            CoreType::IoNode => "IoNode",
            CoreType::IoSource => "IoSource",
            CoreType::IoActor => "IoActor",
            CoreType::Log => "Log",
            CoreType::Task => "Task",
            CoreType::User => "User",
            CoreType::Annotation => "Annotation",
            CoreType::Snapshot => "Snapshot",
        }
    }

    /// Object type assigned to plain instances of this core type.
    pub fn canonical_object_type(self) -> String {
        format!("core.{}", self.name())
    }
}

impl Display for CoreType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoreType {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CoreType::ALL
            .into_iter()
            .find(|core_type| core_type.name() == name)
            .ok_or_else(|| format!("unknown core type {name:?}"))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommObject {
    pub core_type: CoreType,
    pub object_type: String,
    pub object_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_object_id: Option<Uuid>,
    /// IO points only: type tag of the values flowing through the point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// IO points only: values travel as raw bytes instead of JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_raw_io_values: Option<bool>,
    /// IO sources only: desired publication interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rate: Option<u64>,
    /// IO points only: fixed topic used instead of a router-assigned route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_route: Option<String>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl CommObject {
    /// Creates an object of the given core type with its canonical object type.
    pub fn new(core_type: CoreType, name: impl Into<String>) -> Self {
        Self::with_object_type(core_type, core_type.canonical_object_type(), name)
    }

    pub fn with_object_type(
        core_type: CoreType,
        object_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            core_type,
            object_type: object_type.into(),
            object_id: Uuid::new_v4(),
            name: name.into(),
            external_id: None,
            parent_object_id: None,
            value_type: None,
            use_raw_io_values: None,
            update_rate: None,
            external_route: None,
            custom: Map::new(),
        }
    }

    pub fn io_source(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            value_type: Some(value_type.into()),
            ..Self::new(CoreType::IoSource, name)
        }
    }

    pub fn io_actor(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            value_type: Some(value_type.into()),
            ..Self::new(CoreType::IoActor, name)
        }
    }

    pub fn uses_raw_io_values(&self) -> bool {
        self.use_raw_io_values.unwrap_or(false)
    }

    /// True when the object type is the canonical one of its core type.
    pub fn has_canonical_object_type(&self) -> bool {
        self.object_type == self.core_type.canonical_object_type()
    }
}

/// The IO sources and actors an agent hosts within one IO context.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IoNode {
    /// Name of the IO context this node belongs to.
    pub name: String,
    #[serde(default)]
    pub io_sources: Vec<CommObject>,
    #[serde(default)]
    pub io_actors: Vec<CommObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<Value>,
    #[serde(default = "Uuid::new_v4")]
    pub object_id: Uuid,
}

impl IoNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            io_sources: Vec::new(),
            io_actors: Vec::new(),
            characteristics: None,
            object_id: Uuid::new_v4(),
        }
    }

    pub fn with_source(mut self, source: CommObject) -> Self {
        self.io_sources.push(source);
        self
    }

    pub fn with_actor(mut self, actor: CommObject) -> Self {
        self.io_actors.push(actor);
        self
    }

    pub fn io_source(&self, object_id: Uuid) -> Option<&CommObject> {
        self.io_sources
            .iter()
            .find(|source| source.object_id == object_id)
    }

    pub fn io_actor(&self, object_id: Uuid) -> Option<&CommObject> {
        self.io_actors.iter().find(|actor| actor.object_id == object_id)
    }

    /// The node as advertised to other agents.
    pub fn to_object(&self, parent_object_id: Uuid) -> CommObject {
        let mut object = CommObject::new(CoreType::IoNode, self.name.clone());
        object.object_id = self.object_id;
        object.parent_object_id = Some(parent_object_id);
        let point_ids = |points: &[CommObject]| {
            Value::Array(
                points
                    .iter()
                    .map(|point| Value::String(point.object_id.to_string()))
                    .collect(),
            )
        };
        object
            .custom
            .insert("ioSourceIds".to_string(), point_ids(&self.io_sources));
        object
            .custom
            .insert("ioActorIds".to_string(), point_ids(&self.io_actors));
        if let Some(characteristics) = &self.characteristics {
            object
                .custom
                .insert("characteristics".to_string(), characteristics.clone());
        }
        object
    }
}
