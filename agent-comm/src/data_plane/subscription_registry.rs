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

//! Reference-counted transport subscriptions with offline deferral.

use crate::observability::events;
use crate::runtime::transport_worker::CommandSender;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

const COMPONENT: &str = "subscription_registry";

#[derive(Default)]
struct RegistryState {
    online: bool,
    /// Bumped on every reset; releases carrying an older generation are ignored.
    generation: u64,
    ref_counts: HashMap<String, usize>,
    /// Every topic with a live reference, replayed on each online transition.
    deferred: HashSet<String>,
}

pub(crate) struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
    commands: CommandSender,
}

impl SubscriptionRegistry {
    pub(crate) fn new(commands: CommandSender) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            commands,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds one reference to `topic`, issuing the transport subscribe on 0 to 1 while online.
    ///
    /// Returns the generation the reference belongs to.
    pub(crate) fn subscribe(&self, topic: &str) -> u64 {
        let mut state = self.lock();
        state.deferred.insert(topic.to_string());
        let ref_count = {
            let count = state.ref_counts.entry(topic.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if ref_count == 1 && state.online {
            self.commands.subscribe(topic);
        }
        debug!(
            event = events::SUBSCRIPTION_ACQUIRE,
            component = COMPONENT,
            topic,
            ref_count,
            online = state.online,
            "subscription reference added"
        );
        state.generation
    }

    /// Drops one reference; on 1 to 0 the topic is forgotten and unsubscribed while online.
    pub(crate) fn unsubscribe(&self, topic: &str, generation: u64) {
        let mut state = self.lock();
        if generation != state.generation {
            debug!(
                event = events::SUBSCRIPTION_RELEASE_STALE,
                component = COMPONENT,
                topic,
                generation,
                "ignoring release from before the last reset"
            );
            return;
        }
        let Some(count) = state.ref_counts.get_mut(topic) else {
            return;
        };
        *count -= 1;
        let ref_count = *count;
        if ref_count == 0 {
            state.ref_counts.remove(topic);
            state.deferred.remove(topic);
            if state.online {
                self.commands.unsubscribe(topic);
            }
        }
        debug!(
            event = events::SUBSCRIPTION_RELEASE,
            component = COMPONENT,
            topic,
            ref_count,
            "subscription reference released"
        );
    }

    /// Marks the transport online and replays every live topic.
    pub(crate) fn go_online(&self) {
        let mut state = self.lock();
        state.online = true;
        for topic in &state.deferred {
            self.commands.subscribe(topic);
        }
        debug!(
            event = events::SUBSCRIPTION_REPLAY,
            component = COMPONENT,
            topics = state.deferred.len(),
            "replayed deferred subscriptions"
        );
    }

    pub(crate) fn go_offline(&self) {
        self.lock().online = false;
    }

    /// Forgets every reference without issuing transport calls.
    pub(crate) fn reset(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.online = false;
        state.ref_counts.clear();
        state.deferred.clear();
    }

    #[cfg(test)]
    pub(crate) fn ref_count(&self, topic: &str) -> usize {
        self.lock().ref_counts.get(topic).copied().unwrap_or(0)
    }

    pub(crate) fn acquire(self: &Arc<Self>, topic: &str) -> SubscriptionLease {
        let generation = self.subscribe(topic);
        SubscriptionLease {
            registry: self.clone(),
            topic: topic.to_string(),
            generation,
        }
    }
}

/// One reference on a topic, released on drop.
pub(crate) struct SubscriptionLease {
    registry: Arc<SubscriptionRegistry>,
    topic: String,
    generation: u64,
}

impl Drop for SubscriptionLease {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.topic, self.generation);
    }
}
