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

//! The narrow contract the core consumes from an underlying pub/sub client.
//!
//! Reconnect/backoff, session handling and last-will delivery are the adapter's
//! business. The core only issues the calls below and reacts to the two streams.

use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

/// Connection state reported by the transport adapter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ConnectionState {
    #[default]
    Offline,
    Online,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Offline => write!(f, "offline"),
            ConnectionState::Online => write!(f, "online"),
        }
    }
}

/// A message payload as handed to or received from the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

/// One `(topic, payload)` tuple delivered by the transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportMessage {
    pub topic: String,
    pub payload: Payload,
}

impl TransportMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Message the transport publishes on the agent's behalf after an abnormal disconnect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LastWill {
    pub topic: String,
    pub payload: Payload,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("transport failure: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Capability set the communication core needs from a pub/sub client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, last_will: Option<LastWill>) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError>;

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// A fresh receiver on the stream of incoming messages for every subscribed topic.
    fn messages(&self) -> broadcast::Receiver<TransportMessage>;

    /// A receiver observing the connection state; the current value is readable immediately.
    fn connection_states(&self) -> watch::Receiver<ConnectionState>;
}

#[cfg(test)]
mod tests {
    use super::Payload;

    #[test]
    fn payload_exposes_bytes_for_both_variants() {
        assert_eq!(Payload::from("abc").as_bytes(), b"abc");
        assert_eq!(Payload::from(vec![1u8, 2, 3]).len(), 3);
        assert!(Payload::Binary(Vec::new()).is_empty());
    }
}
