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

//! Decoded events and the state values exposed by the manager.

pub(crate) mod data;
pub(crate) mod family;
pub(crate) mod responder;

use crate::error::CommError;
use crate::routing::event_type::EventType;
use crate::routing::topic::Topic;
use crate::transport::Payload;
use data::EventData;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Envelope of one decoded event.
#[derive(Clone, Debug, PartialEq)]
pub struct CommunicationEvent<D> {
    pub event_type: EventType,
    pub namespace: String,
    pub source_id: Uuid,
    pub event_type_filter: Option<String>,
    /// Present on two-way events only.
    pub correlation_id: Option<String>,
    pub data: D,
}

impl<D> CommunicationEvent<D> {
    pub(crate) fn from_topic(topic: &Topic, data: D) -> Self {
        Self {
            event_type: topic.event_type,
            namespace: topic.namespace.clone(),
            source_id: topic.source_id,
            event_type_filter: topic.event_type_filter.clone(),
            correlation_id: topic.correlation_id.clone(),
            data,
        }
    }
}

/// A message received on a raw passthrough subscription.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Payload,
}

/// A value flowing over an IO route.
#[derive(Clone, Debug, PartialEq)]
pub enum IoValue {
    Raw(Vec<u8>),
    Json(serde_json::Value),
}

impl IoValue {
    pub fn is_raw(&self) -> bool {
        matches!(self, IoValue::Raw(_))
    }
}

/// Derived association state of one local IO point.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IoState {
    pub has_associations: bool,
    /// Update rate in milliseconds requested by the router, if any.
    pub update_rate: Option<u64>,
}

/// Lifecycle state of a manager, independent from the transport connection.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OperatingState {
    #[default]
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl Display for OperatingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub(crate) fn encode_payload<D: EventData>(data: &D) -> Result<Payload, CommError> {
    data.validate().map_err(CommError::InvalidArgument)?;
    serde_json::to_string(data)
        .map(Payload::Text)
        .map_err(|err| CommError::invalid_argument(format!("unserializable event data: {err}")))
}

pub(crate) fn decode_payload<D: EventData>(payload: &Payload) -> Result<D, CommError> {
    let data: D = serde_json::from_slice(payload.as_bytes())
        .map_err(|err| CommError::decoding(format!("malformed event payload: {err}")))?;
    data.validate().map_err(CommError::DecodingFailure)?;
    Ok(data)
}
