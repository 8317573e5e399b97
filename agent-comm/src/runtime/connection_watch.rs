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

//! Follows the transport connection state and drives offline/online transitions.

use crate::data_plane::outbound_queue::OutboundQueue;
use crate::data_plane::subscription_registry::SubscriptionRegistry;
use crate::observability::events;
use crate::transport::ConnectionState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

const COMPONENT: &str = "connection_watch";

type OnlineHook = Box<dyn Fn() + Send + Sync>;

pub(crate) struct ConnectionWatch {
    registry: Arc<SubscriptionRegistry>,
    outbound: Arc<OutboundQueue>,
    communication_state: Arc<watch::Sender<ConnectionState>>,
    on_online: OnlineHook,
    last: Option<ConnectionState>,
}

impl ConnectionWatch {
    pub(crate) fn new(
        registry: Arc<SubscriptionRegistry>,
        outbound: Arc<OutboundQueue>,
        communication_state: Arc<watch::Sender<ConnectionState>>,
        on_online: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            outbound,
            communication_state,
            on_online: Box::new(on_online),
            last: None,
        }
    }

    /// Online: replay subscriptions, flush publications, run the online hook, then
    /// announce the new state. Offline: stop publishing before deferring
    /// subscriptions, so a request is never sent while its response subscription is
    /// held back. Repeated states are ignored.
    pub(crate) fn apply(&mut self, state: ConnectionState) {
        if self.last == Some(state) {
            return;
        }
        self.last = Some(state);
        info!(
            event = events::CONNECTION_STATE_CHANGED,
            component = COMPONENT,
            state = ?state,
            "transport connection state changed"
        );
        match state {
            ConnectionState::Online => {
                self.registry.go_online();
                self.outbound.go_online();
                (self.on_online)();
            }
            ConnectionState::Offline => {
                self.outbound.go_offline();
                self.registry.go_offline();
            }
        }
        self.communication_state.send_replace(state);
    }
}

pub(crate) async fn run_connection_watch(
    mut states: watch::Receiver<ConnectionState>,
    mut watch: ConnectionWatch,
) {
    loop {
        let state = *states.borrow_and_update();
        watch.apply(state);
        if states.changed().await.is_err() {
            break;
        }
    }
}
