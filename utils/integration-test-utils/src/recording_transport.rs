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

use agent_comm::{
    ConnectionState, LastWill, Payload, Transport, TransportError, TransportMessage,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// One successful call made on a [`RecordingTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordedCall {
    Connect(Option<LastWill>),
    Disconnect,
    Subscribe(String),
    Unsubscribe(String),
    Publish(String, Payload),
}

/// Transport double that records every successful call, lets the test drive the
/// connection state and inject incoming messages.
///
/// `connect` goes online immediately unless [`hold_connection`](Self::hold_connection)
/// was called, in which case the test flips the state with
/// [`set_state`](Self::set_state).
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    fail_publishes: AtomicBool,
    fail_connect: AtomicBool,
    hold_connection: AtomicBool,
    messages: broadcast::Sender<TransportMessage>,
    state: watch::Sender<ConnectionState>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        let (messages, _) = broadcast::channel(256);
        let (state, _) = watch::channel(ConnectionState::Offline);
        Self {
            calls: Mutex::new(Vec::new()),
            fail_publishes: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            hold_connection: AtomicBool::new(false),
            messages,
            state,
        }
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RecordedCall) {
        debug!("recording transport call: {call:?}");
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().clear();
    }

    /// Topics of every recorded publish, in call order.
    pub fn published_topics(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Publish(topic, _) => Some(topic.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn subscribe_count(&self, topic: &str) -> usize {
        self.count(|call| matches!(call, RecordedCall::Subscribe(t) if t == topic))
    }

    pub fn unsubscribe_count(&self, topic: &str) -> usize {
        self.count(|call| matches!(call, RecordedCall::Unsubscribe(t) if t == topic))
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Keeps the connection offline after `connect` until the test calls `set_state`.
    pub fn hold_connection(&self) {
        self.hold_connection.store(true, Ordering::SeqCst);
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Delivers a message as if the broker had routed it to this client.
    pub fn inject(&self, topic: &str, payload: impl Into<Payload>) {
        let _ = self.messages.send(TransportMessage::new(topic, payload));
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&self, last_will: Option<LastWill>) -> Result<(), TransportError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::new("connect refused"));
        }
        self.record(RecordedCall::Connect(last_will));
        if !self.hold_connection.load(Ordering::SeqCst) {
            self.set_state(ConnectionState::Online);
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.record(RecordedCall::Disconnect);
        self.set_state(ConnectionState::Offline);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(TransportError::new("publish rejected"));
        }
        self.record(RecordedCall::Publish(topic.to_string(), payload));
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::Subscribe(topic.to_string()));
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::Unsubscribe(topic.to_string()));
        Ok(())
    }

    fn messages(&self) -> broadcast::Receiver<TransportMessage> {
        self.messages.subscribe()
    }

    fn connection_states(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}
