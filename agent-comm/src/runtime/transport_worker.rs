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

//! Single task issuing every subscribe/unsubscribe/publish call on the transport.
//!
//! Callers enqueue commands while holding their own bookkeeping lock, so the order
//! in which the transport sees calls equals the order in which bookkeeping changed.

use crate::observability::{events, fields};
use crate::transport::{Transport, TransportMessage};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "transport_worker";

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum TransportCommand {
    Subscribe(String),
    Unsubscribe(String),
    Publish(TransportMessage),
    /// Ends the worker after every previously enqueued command was issued.
    Shutdown,
}

/// Cloneable enqueue side of the command channel.
#[derive(Clone)]
pub(crate) struct CommandSender {
    sender: UnboundedSender<TransportCommand>,
}

impl CommandSender {
    pub(crate) fn channel() -> (Self, UnboundedReceiver<TransportCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub(crate) fn send(&self, command: TransportCommand) {
        // The receiver lives as long as the owning context; a failed send means teardown.
        if let Err(err) = self.sender.send(command) {
            debug!(
                event = events::TRANSPORT_WORKER_STOPPED,
                component = COMPONENT,
                command = ?err.0,
                "command dropped; channel closed"
            );
        }
    }

    pub(crate) fn subscribe(&self, topic: &str) {
        self.send(TransportCommand::Subscribe(topic.to_string()));
    }

    pub(crate) fn unsubscribe(&self, topic: &str) {
        self.send(TransportCommand::Unsubscribe(topic.to_string()));
    }

    pub(crate) fn publish(&self, message: TransportMessage) {
        self.send(TransportCommand::Publish(message));
    }

    pub(crate) fn shutdown(&self) {
        self.send(TransportCommand::Shutdown);
    }
}

/// Drains commands until `Shutdown` and hands the receiver back for the next start.
pub(crate) async fn run_transport_worker(
    transport: Arc<dyn Transport>,
    mut commands: UnboundedReceiver<TransportCommand>,
) -> UnboundedReceiver<TransportCommand> {
    while let Some(command) = commands.recv().await {
        match command {
            TransportCommand::Subscribe(topic) => match transport.subscribe(&topic).await {
                Ok(()) => debug!(
                    event = events::TRANSPORT_SUBSCRIBE_OK,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    "subscribed"
                ),
                Err(err) => warn!(
                    event = events::TRANSPORT_SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    err = %err,
                    "subscribe failed; bookkeeping unchanged"
                ),
            },
            TransportCommand::Unsubscribe(topic) => match transport.unsubscribe(&topic).await {
                Ok(()) => debug!(
                    event = events::TRANSPORT_UNSUBSCRIBE_OK,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    "unsubscribed"
                ),
                Err(err) => warn!(
                    event = events::TRANSPORT_UNSUBSCRIBE_FAILED,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    err = %err,
                    "unsubscribe failed"
                ),
            },
            TransportCommand::Publish(message) => {
                let payload_len = message.payload.len();
                let payload_kind = fields::format_payload_kind(&message.payload);
                match transport.publish(&message.topic, message.payload).await {
                    Ok(()) => {
                        if tracing::enabled!(Level::DEBUG) {
                            debug!(
                                event = events::TRANSPORT_PUBLISH_OK,
                                component = COMPONENT,
                                topic = message.topic.as_str(),
                                payload_len,
                                payload_kind,
                                "published"
                            );
                        }
                    }
                    Err(err) => warn!(
                        event = events::TRANSPORT_PUBLISH_FAILED,
                        component = COMPONENT,
                        topic = message.topic.as_str(),
                        payload_len,
                        err = %err,
                        "publish failed; message dropped"
                    ),
                }
            }
            TransportCommand::Shutdown => break,
        }
    }

    info!(
        event = events::TRANSPORT_WORKER_STOPPED,
        component = COMPONENT,
        "transport worker drained"
    );
    commands
}
