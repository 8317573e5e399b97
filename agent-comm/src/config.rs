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

//! Options handed to a [`CommunicationManager`](crate::CommunicationManager) at construction.

use crate::error::CommError;
use crate::object::{CommObject, CoreType, IoNode};
use crate::routing::topic::{is_valid_event_type_filter, is_valid_namespace};
use crate::routing::topic_filter::{is_protocol_topic, is_valid_publication_topic};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const DEFAULT_NAMESPACE: &str = "-";
pub const DEFAULT_MESSAGE_QUEUE_SIZE: usize = 256;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_message_queue_size() -> usize {
    DEFAULT_MESSAGE_QUEUE_SIZE
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentityOptions {
    pub name: String,
    /// Stable id for the identity; a fresh one is generated when absent.
    #[serde(default)]
    pub object_id: Option<Uuid>,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            object_id: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommunicationOptions {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Subscribe across all namespaces instead of only the own one.
    #[serde(default)]
    pub enable_cross_namespacing: bool,
    #[serde(default)]
    pub identity: IdentityOptions,
    /// Per-stream backlog at which a slow consumer is reported. Streams queue only
    /// their own events and never drop them.
    #[serde(default = "default_message_queue_size")]
    pub message_queue_size: usize,
    #[serde(default)]
    pub io_nodes: Vec<IoNode>,
}

impl Default for CommunicationOptions {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            enable_cross_namespacing: false,
            identity: IdentityOptions::default(),
            message_queue_size: default_message_queue_size(),
            io_nodes: Vec::new(),
        }
    }
}

impl CommunicationOptions {
    pub fn with_identity_name(mut self, name: impl Into<String>) -> Self {
        self.identity.name = name.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_io_node(mut self, io_node: IoNode) -> Self {
        self.io_nodes.push(io_node);
        self
    }

    pub fn validate(&self) -> Result<(), CommError> {
        if !is_valid_namespace(&self.namespace) {
            return Err(CommError::invalid_configuration(format!(
                "invalid namespace {:?}",
                self.namespace
            )));
        }
        if self.message_queue_size == 0 {
            return Err(CommError::invalid_configuration(
                "message queue size must be greater than zero",
            ));
        }

        let mut context_names = HashSet::new();
        let mut point_ids = HashSet::new();
        for io_node in &self.io_nodes {
            if !is_valid_event_type_filter(&io_node.name) {
                return Err(CommError::invalid_configuration(format!(
                    "invalid IO context name {:?}",
                    io_node.name
                )));
            }
            if !context_names.insert(io_node.name.as_str()) {
                return Err(CommError::invalid_configuration(format!(
                    "duplicate IO context name {:?}",
                    io_node.name
                )));
            }
            for source in &io_node.io_sources {
                check_io_point(source, CoreType::IoSource, &io_node.name)?;
                if !point_ids.insert(source.object_id) {
                    return Err(duplicate_point(source));
                }
            }
            for actor in &io_node.io_actors {
                check_io_point(actor, CoreType::IoActor, &io_node.name)?;
                if !point_ids.insert(actor.object_id) {
                    return Err(duplicate_point(actor));
                }
            }
        }
        Ok(())
    }
}

fn duplicate_point(point: &CommObject) -> CommError {
    CommError::invalid_configuration(format!("duplicate IO point id {}", point.object_id))
}

fn check_io_point(point: &CommObject, expected: CoreType, context: &str) -> Result<(), CommError> {
    if point.core_type != expected {
        return Err(CommError::invalid_configuration(format!(
            "IO point {} in context {context:?} has core type {}, expected {expected}",
            point.object_id, point.core_type
        )));
    }
    if let Some(route) = &point.external_route {
        if !is_valid_publication_topic(route) || is_protocol_topic(route) {
            return Err(CommError::invalid_configuration(format!(
                "IO point {} has invalid external route {route:?}",
                point.object_id
            )));
        }
    }
    Ok(())
}
