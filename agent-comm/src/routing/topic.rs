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

//! Structured topic encoding and decoding.
//!
//! Wire shape, segments joined by `/`:
//!
//! ```text
//! v1/<namespace>/<token>[:<filter>]/<sourceId>            one-way events
//! v1/<namespace>/<token>[:<filter>]/<sourceId>/<corrId>   two-way events
//! ```

use crate::error::CommError;
use crate::routing::event_type::{EventType, FilterRule};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const PROTOCOL_VERSION_TOKEN: &str = "v1";
pub const TOPIC_LEVEL_SEPARATOR: char = '/';
pub const FILTER_SEPARATOR: char = ':';
pub const SINGLE_LEVEL_WILDCARD: &str = "+";
pub const MULTI_LEVEL_WILDCARD: &str = "#";

const RESERVED_CHARS: [char; 3] = ['\0', '#', '+'];

const ONE_WAY_SEGMENTS: usize = 4;
const TWO_WAY_SEGMENTS: usize = 5;

fn has_reserved_char(value: &str) -> bool {
    value.chars().any(|ch| RESERVED_CHARS.contains(&ch))
}

/// Namespaces occupy exactly one topic level.
pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && !has_reserved_char(namespace)
        && !namespace.contains(TOPIC_LEVEL_SEPARATOR)
}

/// Object types, channel ids, operation names and IO context names.
pub fn is_valid_event_type_filter(filter: &str) -> bool {
    !filter.is_empty() && !has_reserved_char(filter) && !filter.contains(TOPIC_LEVEL_SEPARATOR)
}

pub(crate) fn is_valid_correlation_id(correlation_id: &str) -> bool {
    is_valid_event_type_filter(correlation_id)
}

/// Decoded form of a structured topic.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Topic {
    pub namespace: String,
    pub event_type: EventType,
    pub event_type_filter: Option<String>,
    pub source_id: Uuid,
    pub correlation_id: Option<String>,
}

impl Topic {
    pub fn one_way(
        namespace: &str,
        event_type: EventType,
        event_type_filter: Option<&str>,
        source_id: Uuid,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            event_type,
            event_type_filter: event_type_filter.map(str::to_string),
            source_id,
            correlation_id: None,
        }
    }

    pub fn two_way(
        namespace: &str,
        event_type: EventType,
        event_type_filter: Option<&str>,
        source_id: Uuid,
        correlation_id: &str,
    ) -> Self {
        Self {
            correlation_id: Some(correlation_id.to_string()),
            ..Self::one_way(namespace, event_type, event_type_filter, source_id)
        }
    }

    /// Builds the wire string, rejecting any field the wire shape cannot carry.
    pub fn encode(&self) -> Result<String, CommError> {
        let token = self.event_type.token().ok_or_else(|| {
            CommError::invalid_argument("raw events have no structured topic")
        })?;
        if !is_valid_namespace(&self.namespace) {
            return Err(CommError::invalid_argument(format!(
                "invalid namespace {:?}",
                self.namespace
            )));
        }
        check_filter(self.event_type, self.event_type_filter.as_deref())
            .map_err(CommError::InvalidArgument)?;
        check_correlation(self.event_type, self.correlation_id.as_deref())
            .map_err(CommError::InvalidArgument)?;

        let mut topic = String::with_capacity(64);
        topic.push_str(PROTOCOL_VERSION_TOKEN);
        topic.push(TOPIC_LEVEL_SEPARATOR);
        topic.push_str(&self.namespace);
        topic.push(TOPIC_LEVEL_SEPARATOR);
        topic.push_str(token);
        if let Some(filter) = &self.event_type_filter {
            topic.push(FILTER_SEPARATOR);
            topic.push_str(filter);
        }
        topic.push(TOPIC_LEVEL_SEPARATOR);
        topic.push_str(&self.source_id.hyphenated().to_string());
        if let Some(correlation_id) = &self.correlation_id {
            topic.push(TOPIC_LEVEL_SEPARATOR);
            topic.push_str(correlation_id);
        }
        Ok(topic)
    }

    pub fn decode(topic: &str) -> Result<Self, CommError> {
        let segments: Vec<&str> = topic.split(TOPIC_LEVEL_SEPARATOR).collect();
        if segments.first() != Some(&PROTOCOL_VERSION_TOKEN) {
            return Err(CommError::decoding(format!(
                "topic {topic:?} does not start with protocol token"
            )));
        }
        if segments.len() < ONE_WAY_SEGMENTS {
            return Err(CommError::decoding(format!(
                "topic {topic:?} has too few levels"
            )));
        }

        let namespace = segments[1];
        if !is_valid_namespace(namespace) {
            return Err(CommError::decoding(format!(
                "topic {topic:?} has an invalid namespace"
            )));
        }

        let (token, event_type_filter) = match segments[2].split_once(FILTER_SEPARATOR) {
            Some((token, filter)) => (token, Some(filter)),
            None => (segments[2], None),
        };
        let event_type = EventType::from_token(token).ok_or_else(|| {
            CommError::decoding(format!("topic {topic:?} has unknown event token {token:?}"))
        })?;
        check_filter(event_type, event_type_filter).map_err(CommError::DecodingFailure)?;

        let expected_segments = if event_type.is_two_way() {
            TWO_WAY_SEGMENTS
        } else {
            ONE_WAY_SEGMENTS
        };
        if segments.len() != expected_segments {
            return Err(CommError::decoding(format!(
                "topic {topic:?} has {} levels, expected {expected_segments} for {event_type}",
                segments.len()
            )));
        }

        let source_id = decode_source_id(segments[3]).map_err(|reason| {
            CommError::decoding(format!("topic {topic:?} has {reason}"))
        })?;
        let correlation_id = segments.get(4).copied();
        check_correlation(event_type, correlation_id).map_err(CommError::DecodingFailure)?;

        Ok(Self {
            namespace: namespace.to_string(),
            event_type,
            event_type_filter: event_type_filter.map(str::to_string),
            source_id,
            correlation_id: correlation_id.map(str::to_string),
        })
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.encode() {
            Ok(topic) => write!(f, "{topic}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

fn check_filter(event_type: EventType, filter: Option<&str>) -> Result<(), String> {
    match (event_type.filter_rule(), filter) {
        (FilterRule::Required, None) => Err(format!("{event_type} requires an event filter")),
        (FilterRule::Forbidden, Some(_)) => Err(format!("{event_type} takes no event filter")),
        (_, Some(filter)) if !is_valid_event_type_filter(filter) => {
            Err(format!("invalid event filter {filter:?}"))
        }
        _ => Ok(()),
    }
}

fn check_correlation(event_type: EventType, correlation_id: Option<&str>) -> Result<(), String> {
    match (event_type.is_two_way(), correlation_id) {
        (true, None) => Err(format!("{event_type} requires a correlation id")),
        (false, Some(_)) => Err(format!("{event_type} takes no correlation id")),
        (true, Some(id)) if !is_valid_correlation_id(id) => {
            Err(format!("invalid correlation id {id:?}"))
        }
        _ => Ok(()),
    }
}

/// Source ids travel as lowercase hyphenated UUIDs only, so decoding and re-encoding
/// a topic reproduces it exactly.
fn decode_source_id(segment: &str) -> Result<Uuid, String> {
    let source_id =
        Uuid::parse_str(segment).map_err(|err| format!("unparsable source id: {err}"))?;
    if source_id.hyphenated().to_string() != segment {
        return Err(format!("non-canonical source id {segment:?}"));
    }
    Ok(source_id)
}

/// Builds the subscription topic matching every publisher of one event family.
///
/// `namespace == None` subscribes across namespaces. For two-way events a missing
/// correlation id subscribes to all requests.
pub(crate) fn subscription_topic(
    namespace: Option<&str>,
    event_type: EventType,
    event_type_filter: Option<&str>,
    correlation_id: Option<&str>,
) -> Result<String, CommError> {
    let token = event_type
        .token()
        .ok_or_else(|| CommError::invalid_argument("raw events have no structured topic"))?;
    let namespace = match namespace {
        Some(namespace) if is_valid_namespace(namespace) => namespace,
        Some(namespace) => {
            return Err(CommError::invalid_argument(format!(
                "invalid namespace {namespace:?}"
            )))
        }
        None => SINGLE_LEVEL_WILDCARD,
    };
    check_filter(event_type, event_type_filter).map_err(CommError::InvalidArgument)?;

    let mut levels = vec![
        PROTOCOL_VERSION_TOKEN.to_string(),
        namespace.to_string(),
        match event_type_filter {
            Some(filter) => format!("{token}{FILTER_SEPARATOR}{filter}"),
            None => token.to_string(),
        },
        SINGLE_LEVEL_WILDCARD.to_string(),
    ];
    if event_type.is_two_way() {
        match correlation_id {
            Some(id) if is_valid_correlation_id(id) => levels.push(id.to_string()),
            Some(id) => {
                return Err(CommError::invalid_argument(format!(
                    "invalid correlation id {id:?}"
                )))
            }
            None => levels.push(SINGLE_LEVEL_WILDCARD.to_string()),
        }
    }
    Ok(levels.join("/"))
}
