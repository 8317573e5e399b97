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

//! FIFO buffering of publications issued while the transport is offline.

use crate::observability::events;
use crate::runtime::transport_worker::CommandSender;
use crate::transport::{Payload, TransportMessage};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const COMPONENT: &str = "outbound_queue";

#[derive(Default)]
struct QueueState {
    online: bool,
    pending: VecDeque<TransportMessage>,
}

/// Online check, enqueue and flush share one lock so nothing is appended after a flush
/// has already observed the queue as empty.
pub(crate) struct OutboundQueue {
    state: Mutex<QueueState>,
    commands: CommandSender,
}

impl OutboundQueue {
    pub(crate) fn new(commands: CommandSender) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            commands,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, topic: String, payload: Payload) {
        let mut state = self.lock();
        let message = TransportMessage { topic, payload };
        if state.online {
            self.commands.publish(message);
            return;
        }
        debug!(
            event = events::PUBLICATION_DEFERRED,
            component = COMPONENT,
            topic = message.topic.as_str(),
            queue_len = state.pending.len() + 1,
            "transport offline; publication deferred"
        );
        state.pending.push_back(message);
    }

    /// Marks the transport online and flushes every deferred publication in order.
    pub(crate) fn go_online(&self) {
        let mut state = self.lock();
        state.online = true;
        let flushed = state.pending.len();
        for message in state.pending.drain(..) {
            self.commands.publish(message);
        }
        if flushed > 0 {
            debug!(
                event = events::PUBLICATION_FLUSH,
                component = COMPONENT,
                queue_len = flushed,
                "flushed deferred publications"
            );
        }
    }

    pub(crate) fn go_offline(&self) {
        self.lock().online = false;
    }

    /// Drops undelivered publications and returns to the offline state.
    pub(crate) fn clear(&self) {
        let mut state = self.lock();
        state.online = false;
        state.pending.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::transport_worker::TransportCommand;

    #[test]
    fn offline_publications_flush_once_in_order() {
        let (sender, mut receiver) = CommandSender::channel();
        let queue = OutboundQueue::new(sender);

        queue.publish("a".to_string(), "1".into());
        queue.publish("b".to_string(), "2".into());
        assert!(receiver.try_recv().is_err());
        assert_eq!(queue.len(), 2);

        queue.go_online();
        assert_eq!(
            receiver.try_recv().unwrap(),
            TransportCommand::Publish(TransportMessage::new("a", "1"))
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            TransportCommand::Publish(TransportMessage::new("b", "2"))
        );
        assert!(receiver.try_recv().is_err());
        assert_eq!(queue.len(), 0);

        queue.go_online();
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn online_publications_bypass_the_queue() {
        let (sender, mut receiver) = CommandSender::channel();
        let queue = OutboundQueue::new(sender);
        queue.go_online();

        queue.publish("a".to_string(), "1".into());

        assert_eq!(queue.len(), 0);
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn clear_discards_pending_publications() {
        let (sender, mut receiver) = CommandSender::channel();
        let queue = OutboundQueue::new(sender);

        queue.publish("a".to_string(), "1".into());
        queue.clear();
        queue.go_online();

        assert!(receiver.try_recv().is_err());
    }
}
