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

//! Start/stop orchestration of the background tasks, identity advertisement and
//! last-will handling.

use crate::control_plane::io_router::IoRouter;
use crate::data_plane::dispatcher::EventDispatcher;
use crate::data_plane::outbound_queue::OutboundQueue;
use crate::error::CommError;
use crate::event::data::{AdvertiseEvent, AssociateEvent, DeadvertiseEvent, ResolveEvent};
use crate::event::family::DiscoverFamily;
use crate::event::{encode_payload, OperatingState};
use crate::object::{CommObject, IoNode};
use crate::observability::events;
use crate::routing::event_type::EventType;
use crate::routing::topic::Topic;
use crate::runtime::connection_watch::{run_connection_watch, ConnectionWatch};
use crate::runtime::ingress_pump::run_ingress_pump;
use crate::runtime::transport_worker::{run_transport_worker, CommandSender, TransportCommand};
use crate::transport::{ConnectionState, LastWill, Transport, TransportError};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

const COMPONENT: &str = "lifecycle";

/// Failures for start orchestration.
#[derive(Debug)]
pub(crate) enum LifecycleError {
    NoRuntime,
    WorkerUnavailable,
    ConnectFailed(TransportError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::NoRuntime => write!(f, "start must be called within a tokio runtime"),
            LifecycleError::WorkerUnavailable => {
                write!(f, "transport worker did not survive the previous stop")
            }
            LifecycleError::ConnectFailed(err) => write!(f, "transport connect failed: {err}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<LifecycleError> for CommError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::ConnectFailed(err) => CommError::Transport(err),
            other => CommError::invalid_configuration(other.to_string()),
        }
    }
}

#[derive(Default)]
struct RuntimeTasks {
    idle_commands: Option<UnboundedReceiver<TransportCommand>>,
    worker: Option<JoinHandle<UnboundedReceiver<TransportCommand>>>,
    background: Vec<JoinHandle<()>>,
}

pub(crate) struct LifecycleController {
    transport: Arc<dyn Transport>,
    dispatcher: EventDispatcher,
    outbound: Arc<OutboundQueue>,
    commands: CommandSender,
    io_router: Arc<IoRouter>,
    identity: CommObject,
    io_nodes: Vec<IoNode>,
    communication_state: Arc<watch::Sender<ConnectionState>>,
    operating_state: watch::Sender<OperatingState>,
    transition: tokio::sync::Mutex<()>,
    tasks: Mutex<RuntimeTasks>,
}

pub(crate) struct LifecycleParts {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) outbound: Arc<OutboundQueue>,
    pub(crate) commands: CommandSender,
    pub(crate) command_receiver: UnboundedReceiver<TransportCommand>,
    pub(crate) io_router: Arc<IoRouter>,
    pub(crate) identity: CommObject,
    pub(crate) io_nodes: Vec<IoNode>,
}

impl LifecycleController {
    pub(crate) fn new(parts: LifecycleParts) -> Self {
        Self {
            transport: parts.transport,
            dispatcher: parts.dispatcher,
            outbound: parts.outbound,
            commands: parts.commands,
            io_router: parts.io_router,
            identity: parts.identity,
            io_nodes: parts.io_nodes,
            communication_state: Arc::new(watch::channel(ConnectionState::Offline).0),
            operating_state: watch::channel(OperatingState::Stopped).0,
            transition: tokio::sync::Mutex::new(()),
            tasks: Mutex::new(RuntimeTasks {
                idle_commands: Some(parts.command_receiver),
                ..RuntimeTasks::default()
            }),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, RuntimeTasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn identity(&self) -> &CommObject {
        &self.identity
    }

    pub(crate) fn operating_state(&self) -> OperatingState {
        *self.operating_state.borrow()
    }

    pub(crate) fn operating_states(&self) -> watch::Receiver<OperatingState> {
        self.operating_state.subscribe()
    }

    pub(crate) fn communication_states(&self) -> watch::Receiver<ConnectionState> {
        self.communication_state.subscribe()
    }

    fn set_operating_state(&self, state: OperatingState) {
        self.operating_state.send_replace(state);
        debug!(
            event = events::OPERATING_STATE_CHANGED,
            component = COMPONENT,
            state = %state,
            "operating state changed"
        );
    }

    /// Identity followed by every IO node, as advertised on each online transition.
    pub(crate) fn advertised_objects(&self) -> Vec<CommObject> {
        std::iter::once(self.identity.clone())
            .chain(
                self.io_nodes
                    .iter()
                    .map(|io_node| io_node.to_object(self.identity.object_id)),
            )
            .collect()
    }

    fn deadvertise_event(&self) -> DeadvertiseEvent {
        DeadvertiseEvent {
            object_ids: std::iter::once(self.identity.object_id)
                .chain(self.io_nodes.iter().map(|io_node| io_node.object_id))
                .collect(),
        }
    }

    fn last_will(&self) -> Result<LastWill, CommError> {
        let topic = Topic::one_way(
            self.dispatcher.namespace(),
            EventType::Deadvertise,
            None,
            self.identity.object_id,
        )
        .encode()?;
        Ok(LastWill {
            topic,
            payload: encode_payload(&self.deadvertise_event())?,
        })
    }

    pub(crate) async fn start(&self) -> Result<(), CommError> {
        let _transition = self.transition.lock().await;
        if self.operating_state() == OperatingState::Started {
            return Ok(());
        }
        let runtime = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;
        let last_will = self.last_will()?;
        let commands = self
            .tasks()
            .idle_commands
            .take()
            .ok_or(LifecycleError::WorkerUnavailable)?;

        info!(
            event = events::LIFECYCLE_START,
            component = COMPONENT,
            identity = %self.identity.object_id,
            namespace = self.dispatcher.namespace(),
            "starting communication manager"
        );
        self.set_operating_state(OperatingState::Starting);

        let worker = runtime.spawn(run_transport_worker(self.transport.clone(), commands));
        self.tasks().worker = Some(worker);

        let background = match self.spawn_background(&runtime) {
            Ok(background) => background,
            Err(err) => {
                self.halt().await;
                self.set_operating_state(OperatingState::Stopped);
                return Err(err);
            }
        };
        self.tasks().background = background;

        if let Err(err) = self.transport.connect(Some(last_will)).await {
            warn!(
                event = events::LIFECYCLE_START_FAILED,
                component = COMPONENT,
                err = %err,
                "transport connect failed; start aborted"
            );
            self.halt().await;
            self.set_operating_state(OperatingState::Stopped);
            return Err(LifecycleError::ConnectFailed(err).into());
        }

        self.set_operating_state(OperatingState::Started);
        info!(
            event = events::LIFECYCLE_STARTED,
            component = COMPONENT,
            identity = %self.identity.object_id,
            "communication manager started"
        );
        Ok(())
    }

    fn spawn_background(&self, runtime: &Handle) -> Result<Vec<JoinHandle<()>>, CommError> {
        let mut background = vec![runtime.spawn(run_ingress_pump(
            self.transport.messages(),
            self.dispatcher.hub().clone(),
        ))];

        let dispatcher = self.dispatcher.clone();
        let objects = self.advertised_objects();
        let watch = ConnectionWatch::new(
            self.dispatcher.registry().clone(),
            self.outbound.clone(),
            self.communication_state.clone(),
            move || advertise_all(&dispatcher, &objects),
        );
        background.push(runtime.spawn(run_connection_watch(
            self.transport.connection_states(),
            watch,
        )));

        for io_node in &self.io_nodes {
            let mut associations = self
                .dispatcher
                .observe_events::<AssociateEvent>(EventType::Associate, Some(&io_node.name))?
                .attach()?;
            let router = self.io_router.clone();
            let context = io_node.name.clone();
            background.push(runtime.spawn(async move {
                while let Some(event) = associations.next().await {
                    router.handle_associate(&context, &event.data);
                }
            }));
        }

        let mut discovers = self
            .dispatcher
            .observe_requests::<DiscoverFamily>(None)?
            .attach()?;
        let objects = self.advertised_objects();
        background.push(runtime.spawn(async move {
            while let Some(request) = discovers.next().await {
                let mut matching = objects
                    .iter()
                    .filter(|object| request.data().matches(object))
                    .cloned();
                let Some(object) = matching.next() else {
                    continue;
                };
                let related: Vec<CommObject> = matching.collect();
                debug!(
                    event = events::IDENTITY_RESOLVE,
                    component = COMPONENT,
                    object_id = %object.object_id,
                    requester = %request.event.source_id,
                    "answering discover"
                );
                let resolve = ResolveEvent {
                    object: Some(object),
                    related_objects: (!related.is_empty()).then_some(related),
                    private_data: None,
                };
                if let Err(err) = request.respond(resolve) {
                    warn!(
                        event = events::IDENTITY_RESOLVE,
                        component = COMPONENT,
                        err = %err,
                        "failed to answer discover"
                    );
                }
            }
        }));

        debug!(
            event = events::RUNTIME_SPAWN_OK,
            component = COMPONENT,
            tasks = background.len(),
            "background tasks spawned"
        );
        Ok(background)
    }

    pub(crate) async fn stop(&self) -> Result<(), CommError> {
        let _transition = self.transition.lock().await;
        if self.operating_state() == OperatingState::Stopped {
            return Ok(());
        }
        info!(
            event = events::LIFECYCLE_STOP,
            component = COMPONENT,
            identity = %self.identity.object_id,
            "stopping communication manager"
        );
        self.set_operating_state(OperatingState::Stopping);

        if let Err(err) =
            self.dispatcher
                .publish_event(EventType::Deadvertise, None, &self.deadvertise_event())
        {
            warn!(
                event = events::LIFECYCLE_DEADVERTISE_FAILED,
                component = COMPONENT,
                err = %err,
                "graceful deadvertise failed"
            );
        }

        self.halt().await;

        if let Err(err) = self.transport.disconnect().await {
            warn!(
                event = events::LIFECYCLE_DISCONNECT_FAILED,
                component = COMPONENT,
                err = %err,
                "transport disconnect failed"
            );
        }
        self.set_operating_state(OperatingState::Stopped);
        info!(
            event = events::LIFECYCLE_STOPPED,
            component = COMPONENT,
            identity = %self.identity.object_id,
            "communication manager stopped"
        );
        Ok(())
    }

    /// Stops background tasks, releases every subscription and drains the transport
    /// worker. Live event streams end.
    async fn halt(&self) {
        let background = std::mem::take(&mut self.tasks().background);
        for task in &background {
            task.abort();
        }
        for task in background {
            let _ = task.await;
        }

        self.io_router.teardown();
        self.dispatcher.registry().reset();
        self.outbound.clear();

        let worker = self.tasks().worker.take();
        if let Some(worker) = worker {
            self.commands.shutdown();
            match worker.await {
                Ok(mut commands) => {
                    while commands.try_recv().is_ok() {}
                    self.tasks().idle_commands = Some(commands);
                }
                Err(err) => warn!(
                    event = events::TRANSPORT_WORKER_STOPPED,
                    component = COMPONENT,
                    err = %err,
                    "transport worker ended abnormally"
                ),
            }
        }

        self.dispatcher.hub().close();
        self.communication_state
            .send_replace(ConnectionState::Offline);
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        let mut tasks = self.tasks();
        for task in tasks.background.drain(..) {
            task.abort();
        }
        if let Some(worker) = tasks.worker.take() {
            worker.abort();
        }
    }
}

fn advertise_all(dispatcher: &EventDispatcher, objects: &[CommObject]) {
    for object in objects {
        let result = dispatcher.publish_advertise(&AdvertiseEvent::new(object.clone()));
        match result {
            Ok(()) => debug!(
                event = events::IDENTITY_ADVERTISE,
                component = COMPONENT,
                object_id = %object.object_id,
                core_type = %object.core_type,
                "advertised"
            ),
            Err(err) => warn!(
                event = events::IDENTITY_ADVERTISE,
                component = COMPONENT,
                object_id = %object.object_id,
                err = %err,
                "advertisement rejected"
            ),
        }
    }
}
