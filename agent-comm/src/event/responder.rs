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

//! One-shot reply channel attached to incoming two-way requests.

use crate::data_plane::dispatcher::EventDispatcher;
use crate::error::CommError;
use crate::event::data::EventData;
use crate::event::family::RequestFamily;
use crate::event::{encode_payload, CommunicationEvent};
use crate::routing::topic::Topic;
use std::fmt::{Debug, Formatter};

/// Publishes exactly one response to the request it was created for.
///
/// `respond` consumes the responder, so a second reply does not type-check.
pub struct Responder<F: RequestFamily> {
    dispatcher: EventDispatcher,
    namespace: String,
    correlation_id: String,
    request: F::Request,
}

impl<F: RequestFamily> Responder<F> {
    pub(crate) fn new(
        dispatcher: EventDispatcher,
        namespace: String,
        correlation_id: String,
        request: F::Request,
    ) -> Self {
        Self {
            dispatcher,
            namespace,
            correlation_id,
            request,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Validates `response` against the request and publishes it with the request's
    /// correlation id.
    pub fn respond(self, response: F::Response) -> Result<(), CommError> {
        response.validate().map_err(CommError::InvalidArgument)?;
        if !F::accepts(&self.request, &response) {
            return Err(CommError::invalid_argument(format!(
                "{} does not satisfy the {} it answers",
                F::RESPONSE,
                F::REQUEST
            )));
        }
        let topic = Topic::two_way(
            &self.namespace,
            F::RESPONSE,
            None,
            self.dispatcher.source_id(),
            &self.correlation_id,
        );
        let payload = encode_payload(&response)?;
        self.dispatcher.publish_encoded(&topic, payload)
    }
}

impl<F: RequestFamily> Debug for Responder<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("response_type", &F::RESPONSE)
            .field("namespace", &self.namespace)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

/// A decoded request together with the means to answer it.
#[derive(Debug)]
pub struct IncomingRequest<F: RequestFamily> {
    pub event: CommunicationEvent<F::Request>,
    pub responder: Responder<F>,
}

impl<F: RequestFamily> IncomingRequest<F> {
    pub(crate) fn new(event: CommunicationEvent<F::Request>, responder: Responder<F>) -> Self {
        Self { event, responder }
    }

    pub fn data(&self) -> &F::Request {
        &self.event.data
    }

    pub fn respond(self, response: F::Response) -> Result<(), CommError> {
        self.responder.respond(response)
    }
}
