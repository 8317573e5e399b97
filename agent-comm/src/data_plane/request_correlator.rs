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

//! Two-way request publication and response correlation.

use crate::data_plane::dispatcher::{decode_or_skip, EventDispatcher};
use crate::data_plane::ingress_hub::InboundMessage;
use crate::data_plane::observable::{Decoder, EventObservable};
use crate::error::CommError;
use crate::event::family::RequestFamily;
use crate::event::{encode_payload, CommunicationEvent};
use crate::observability::events;
use crate::routing::topic::{subscription_topic, Topic};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "request_correlator";

/// 128 random bits as 32 lowercase hex characters.
pub(crate) fn new_correlation_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Publishes a request of family `F` and returns the stream of its validated responses.
///
/// The response subscription is acquired before the request is enqueued, so a fast
/// responder cannot answer ahead of it.
pub(crate) fn publish_request<F: RequestFamily>(
    dispatcher: &EventDispatcher,
    filter: Option<&str>,
    request: F::Request,
) -> Result<EventObservable<CommunicationEvent<F::Response>>, CommError> {
    let correlation_id = new_correlation_id();
    let request_topic = Topic::two_way(
        dispatcher.namespace(),
        F::REQUEST,
        filter,
        dispatcher.source_id(),
        &correlation_id,
    )
    .encode()?;
    let response_topic = subscription_topic(
        Some(dispatcher.namespace()),
        F::RESPONSE,
        None,
        Some(&correlation_id),
    )?;
    let payload = encode_payload(&request)?;

    let namespace = dispatcher.namespace().to_string();
    let expected_id = correlation_id.clone();
    let decoder: Decoder<CommunicationEvent<F::Response>> =
        Arc::new(move |message: &InboundMessage| {
            let topic = message.structured.as_ref().filter(|topic| {
                topic.event_type == F::RESPONSE
                    && topic.namespace == namespace
                    && topic.correlation_id.as_deref() == Some(expected_id.as_str())
            })?;
            let response = decode_or_skip::<F::Response>(message, topic)?;
            if !F::accepts(&request, &response) {
                debug!(
                    event = events::DISPATCH_RESPONSE_REJECTED,
                    component = COMPONENT,
                    correlation_id = expected_id.as_str(),
                    source_id = %topic.source_id,
                    "response does not satisfy its request; discarded"
                );
                return None;
            }
            Some(CommunicationEvent::from_topic(topic, response))
        });

    let observable = EventObservable::eager(
        response_topic,
        dispatcher.hub().clone(),
        dispatcher.registry().clone(),
        decoder,
    );
    dispatcher.enqueue(request_topic, payload);
    Ok(observable)
}
