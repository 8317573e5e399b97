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

//! Event-type catalogue and its wire tokens.

use std::fmt::{Display, Formatter};

/// Whether an event type's topic carries a sub-address after the filter separator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FilterRule {
    Required,
    Forbidden,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventType {
    Advertise,
    Deadvertise,
    Channel,
    Discover,
    Resolve,
    Update,
    Complete,
    Query,
    Retrieve,
    Call,
    Return,
    Associate,
    IoValue,
    Raw,
}

impl EventType {
    pub const STRUCTURED: [EventType; 13] = [
        EventType::Advertise,
        EventType::Deadvertise,
        EventType::Channel,
        EventType::Discover,
        EventType::Resolve,
        EventType::Update,
        EventType::Complete,
        EventType::Query,
        EventType::Retrieve,
        EventType::Call,
        EventType::Return,
        EventType::Associate,
        EventType::IoValue,
    ];

    /// Wire token, `None` for raw passthrough which has no structured topic.
    pub fn token(self) -> Option<&'static str> {
        let token = match self {
            EventType::Advertise => "ADV",
            EventType::Deadvertise => "DAD",
            EventType::Channel => "CHN",
            EventType::Discover => "DSC",
            EventType::Resolve => "RSV",
            EventType::Update => "UPD",
            EventType::Complete => "CPL",
            EventType::Query => "QRY",
            EventType::Retrieve => "RTV",
            EventType::Call => "CLL",
            EventType::Return => "RTN",
            EventType::Associate => "ASC",
            EventType::IoValue => "IOV",
            EventType::Raw => return None,
        };
        Some(token)
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::STRUCTURED
            .into_iter()
            .find(|event_type| event_type.token() == Some(token))
    }

    /// True for both halves of a request/response pair.
    pub fn is_two_way(self) -> bool {
        self.response_type().is_some() || self.request_type().is_some()
    }

    pub fn response_type(self) -> Option<EventType> {
        match self {
            EventType::Discover => Some(EventType::Resolve),
            EventType::Update => Some(EventType::Complete),
            EventType::Query => Some(EventType::Retrieve),
            EventType::Call => Some(EventType::Return),
            _ => None,
        }
    }

    pub fn request_type(self) -> Option<EventType> {
        match self {
            EventType::Resolve => Some(EventType::Discover),
            EventType::Complete => Some(EventType::Update),
            EventType::Retrieve => Some(EventType::Query),
            EventType::Return => Some(EventType::Call),
            _ => None,
        }
    }

    pub(crate) fn filter_rule(self) -> FilterRule {
        match self {
            EventType::Advertise
            | EventType::Channel
            | EventType::Update
            | EventType::Call
            | EventType::Associate => FilterRule::Required,
            _ => FilterRule::Forbidden,
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
