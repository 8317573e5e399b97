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

//! Moves transport messages into the ingress hub, decoding protocol topics once.

use crate::data_plane::ingress_hub::{InboundMessage, IngressHub};
use crate::observability::{events, fields};
use crate::routing::topic::Topic;
use crate::routing::topic_filter::is_protocol_topic;
use crate::transport::TransportMessage;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn, Level};

const COMPONENT: &str = "ingress_pump";

/// `None` for protocol topics that do not decode; such messages are dropped.
pub(crate) fn to_inbound(message: TransportMessage) -> Option<InboundMessage> {
    let structured = if is_protocol_topic(&message.topic) {
        match Topic::decode(&message.topic) {
            Ok(topic) => Some(topic),
            Err(err) => {
                warn!(
                    event = events::DISPATCH_DECODE_FAILED,
                    component = COMPONENT,
                    topic = message.topic.as_str(),
                    err = %err,
                    "dropping message with malformed protocol topic"
                );
                return None;
            }
        }
    } else {
        None
    };
    Some(InboundMessage {
        topic: message.topic,
        structured,
        payload: message.payload,
    })
}

pub(crate) async fn run_ingress_pump(
    mut messages: broadcast::Receiver<TransportMessage>,
    hub: Arc<IngressHub>,
) {
    loop {
        match messages.recv().await {
            Ok(message) => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        event = events::INGRESS_RECEIVE,
                        component = COMPONENT,
                        topic = message.topic.as_str(),
                        payload_len = message.payload.len(),
                        payload_kind = fields::format_payload_kind(&message.payload),
                        "received transport message"
                    );
                }
                if let Some(inbound) = to_inbound(message) {
                    hub.dispatch(inbound);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(
                    event = events::INGRESS_RECV_LAGGED,
                    component = COMPONENT,
                    skipped,
                    "transport receiver lagged; messages skipped"
                );
            }
            Err(RecvError::Closed) => {
                debug!(
                    event = events::INGRESS_RECV_CLOSED,
                    component = COMPONENT,
                    reason = fields::REASON_BROADCAST_CLOSED,
                    "transport message stream closed"
                );
                break;
            }
        }
    }
}
