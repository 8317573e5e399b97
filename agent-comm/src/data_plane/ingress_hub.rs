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

//! Fan-out of incoming transport messages to every live event stream.
//!
//! Each stream registers a sink that decides on the spot whether a message belongs to
//! it and queues only those, so traffic on unrelated topics never occupies a stream's
//! backlog.

use crate::routing::topic::Topic;
use crate::transport::Payload;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An incoming message whose topic was decoded once for all observers.
#[derive(Debug)]
pub(crate) struct InboundMessage {
    pub(crate) topic: String,
    /// `None` for raw and external-route topics.
    pub(crate) structured: Option<Topic>,
    pub(crate) payload: Payload,
}

/// Offers one message to a stream; returns `false` once the stream is gone.
pub(crate) type Sink = Arc<dyn Fn(&InboundMessage) -> bool + Send + Sync>;

#[derive(Default)]
struct HubState {
    next_id: u64,
    sinks: Vec<(u64, Sink)>,
}

pub(crate) struct IngressHub {
    backlog_warning: usize,
    state: Mutex<HubState>,
}

impl IngressHub {
    /// `backlog_warning` is the per-stream queue length at which a warning is logged.
    pub(crate) fn new(backlog_warning: usize) -> Self {
        Self {
            backlog_warning: backlog_warning.max(1),
            state: Mutex::new(HubState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn backlog_warning(&self) -> usize {
        self.backlog_warning
    }

    pub(crate) fn register(self: &Arc<Self>, sink: Sink) -> HubRegistration {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.sinks.push((id, sink));
        HubRegistration {
            hub: Arc::downgrade(self),
            id,
        }
    }

    fn unregister(&self, id: u64) {
        self.lock().sinks.retain(|(sink_id, _)| *sink_id != id);
    }

    /// Offers `message` to every registered stream in registration order.
    ///
    /// Returns the number of streams still alive.
    pub(crate) fn dispatch(&self, message: InboundMessage) -> usize {
        let sinks = self.lock().sinks.clone();
        let mut gone = Vec::new();
        for (id, sink) in &sinks {
            if !sink(&message) {
                gone.push(*id);
            }
        }
        if !gone.is_empty() {
            self.lock().sinks.retain(|(id, _)| !gone.contains(id));
        }
        sinks.len() - gone.len()
    }

    /// Ends every stream currently attached; later registrations work as before.
    pub(crate) fn close(&self) {
        let closed = std::mem::take(&mut self.lock().sinks);
        drop(closed);
    }
}

/// Keeps a sink registered; dropping it removes the sink.
pub(crate) struct HubRegistration {
    hub: Weak<IngressHub>,
    id: u64,
}

impl Drop for HubRegistration {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unregister(self.id);
        }
    }
}
