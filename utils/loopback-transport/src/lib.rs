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

//! In-process pub/sub broker implementing the `agent-comm` [`Transport`] contract.
//!
//! Every [`LoopbackTransport`] created from one [`LoopbackBroker`] behaves like an
//! MQTT client of that broker: subscriptions use `+`/`#` wildcards, a client receives
//! each matching publication once, and its last will is published when the connection
//! is interrupted rather than closed.
//!
//! ```
//! use agent_comm::{ConnectionState, Transport};
//! use loopback_transport::LoopbackBroker;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let broker = LoopbackBroker::new();
//! let publisher = broker.client();
//! let subscriber = broker.client();
//! let mut messages = subscriber.messages();
//!
//! publisher.connect(None).await.unwrap();
//! subscriber.connect(None).await.unwrap();
//! subscriber.subscribe("sensors/+/temp").await.unwrap();
//! publisher.publish("sensors/a/temp", "21.5".into()).await.unwrap();
//!
//! assert_eq!(messages.recv().await.unwrap().topic, "sensors/a/temp");
//! assert_eq!(*subscriber.connection_states().borrow(), ConnectionState::Online);
//! # });
//! ```

use agent_comm::{
    topic_matches, ConnectionState, LastWill, Payload, Transport, TransportError,
    TransportMessage,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{broadcast, watch};
use tracing::debug;

const COMPONENT: &str = "loopback_transport";
const CLIENT_BUFFER: usize = 1024;

#[derive(Default)]
struct BrokerState {
    next_client_id: usize,
    clients: Vec<Weak<ClientShared>>,
}

/// Shared routing core; clone freely.
#[derive(Clone, Default)]
pub struct LoopbackBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl LoopbackBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new, disconnected client of this broker.
    pub fn client(&self) -> LoopbackTransport {
        let mut state = self.lock();
        state.clients.retain(|client| client.strong_count() > 0);
        let id = state.next_client_id;
        state.next_client_id += 1;

        let (messages, _) = broadcast::channel(CLIENT_BUFFER);
        let (connection, _) = watch::channel(ConnectionState::Offline);
        let shared = Arc::new(ClientShared {
            id,
            messages,
            connection,
            session: Mutex::new(Session::default()),
        });
        state.clients.push(Arc::downgrade(&shared));
        LoopbackTransport {
            broker: self.clone(),
            shared,
        }
    }

    /// Number of clients currently connected.
    pub fn connected_clients(&self) -> usize {
        self.live_clients()
            .iter()
            .filter(|client| client.is_online())
            .count()
    }

    fn live_clients(&self) -> Vec<Arc<ClientShared>> {
        self.lock()
            .clients
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn route(&self, message: TransportMessage) -> usize {
        let mut delivered = 0;
        for client in self.live_clients() {
            if client.is_online() && client.is_subscribed_to(&message.topic) {
                let _ = client.messages.send(message.clone());
                delivered += 1;
            }
        }
        debug!(
            component = COMPONENT,
            topic = message.topic.as_str(),
            delivered,
            "routed publication"
        );
        delivered
    }
}

#[derive(Default)]
struct Session {
    subscriptions: BTreeSet<String>,
    last_will: Option<LastWill>,
}

struct ClientShared {
    id: usize,
    messages: broadcast::Sender<TransportMessage>,
    connection: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
}

impl ClientShared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_online(&self) -> bool {
        *self.connection.borrow() == ConnectionState::Online
    }

    fn is_subscribed_to(&self, topic: &str) -> bool {
        self.session()
            .subscriptions
            .iter()
            .any(|filter| topic_matches(topic, filter))
    }
}

/// One client connection to a [`LoopbackBroker`].
#[derive(Clone)]
pub struct LoopbackTransport {
    broker: LoopbackBroker,
    shared: Arc<ClientShared>,
}

impl LoopbackTransport {
    fn ensure_online(&self) -> Result<(), TransportError> {
        if self.shared.is_online() {
            Ok(())
        } else {
            Err(TransportError::new(format!(
                "loopback client {} is not connected",
                self.shared.id
            )))
        }
    }

    /// Subscriptions of the current session, sorted.
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared.session().subscriptions.iter().cloned().collect()
    }

    /// Simulates an unexpected connection loss: the session is dropped and its last
    /// will, if any, is published to the other clients.
    pub fn interrupt(&self) {
        if !self.shared.is_online() {
            return;
        }
        let last_will = {
            let mut session = self.shared.session();
            session.subscriptions.clear();
            session.last_will.take()
        };
        self.shared.connection.send_replace(ConnectionState::Offline);
        debug!(
            component = COMPONENT,
            client_id = self.shared.id,
            has_last_will = last_will.is_some(),
            "connection interrupted"
        );
        if let Some(last_will) = last_will {
            self.broker
                .route(TransportMessage::new(last_will.topic, last_will.payload));
        }
    }

    /// Re-establishes an interrupted connection with a fresh, empty session.
    pub fn resume(&self) {
        self.shared.connection.send_replace(ConnectionState::Online);
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self, last_will: Option<LastWill>) -> Result<(), TransportError> {
        self.shared.session().last_will = last_will;
        self.shared.connection.send_replace(ConnectionState::Online);
        debug!(component = COMPONENT, client_id = self.shared.id, "connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        *self.shared.session() = Session::default();
        self.shared.connection.send_replace(ConnectionState::Offline);
        debug!(component = COMPONENT, client_id = self.shared.id, "disconnected");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError> {
        self.ensure_online()?;
        self.broker.route(TransportMessage::new(topic, payload));
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.ensure_online()?;
        self.shared.session().subscriptions.insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.ensure_online()?;
        self.shared.session().subscriptions.remove(topic);
        Ok(())
    }

    fn messages(&self) -> broadcast::Receiver<TransportMessage> {
        self.shared.messages.subscribe()
    }

    fn connection_states(&self) -> watch::Receiver<ConnectionState> {
        self.shared.connection.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overlapping_subscriptions_deliver_once() {
        let broker = LoopbackBroker::new();
        let client = broker.client();
        let mut messages = client.messages();
        client.connect(None).await.unwrap();
        client.subscribe("a/#").await.unwrap();
        client.subscribe("a/+").await.unwrap();

        client.publish("a/b", "1".into()).await.unwrap();
        client.publish("c/d", "2".into()).await.unwrap();

        assert_eq!(messages.recv().await.unwrap().topic, "a/b");
        assert!(messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn offline_clients_cannot_publish() {
        let broker = LoopbackBroker::new();
        let client = broker.client();
        assert!(client.publish("a", "1".into()).await.is_err());
        assert!(client.subscribe("a").await.is_err());
    }

    #[tokio::test]
    async fn interruption_publishes_the_last_will() {
        let broker = LoopbackBroker::new();
        let watcher = broker.client();
        let dying = broker.client();
        let mut messages = watcher.messages();
        watcher.connect(None).await.unwrap();
        watcher.subscribe("wills/#").await.unwrap();
        dying
            .connect(Some(LastWill {
                topic: "wills/dying".to_string(),
                payload: "gone".into(),
            }))
            .await
            .unwrap();

        dying.interrupt();

        let will = messages.recv().await.unwrap();
        assert_eq!(will.topic, "wills/dying");
        assert_eq!(broker.connected_clients(), 1);
    }

    #[tokio::test]
    async fn graceful_disconnect_discards_the_last_will() {
        let broker = LoopbackBroker::new();
        let watcher = broker.client();
        let leaving = broker.client();
        let mut messages = watcher.messages();
        watcher.connect(None).await.unwrap();
        watcher.subscribe("#").await.unwrap();
        leaving
            .connect(Some(LastWill {
                topic: "wills/leaving".to_string(),
                payload: "gone".into(),
            }))
            .await
            .unwrap();

        leaving.disconnect().await.unwrap();
        leaving.interrupt();

        assert!(messages.try_recv().is_err());
        assert!(leaving.subscriptions().is_empty());
    }
}
