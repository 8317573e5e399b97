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

//! Self-cleaning event streams.
//!
//! An [`EventObservable`] hands out [`EventSubscription`]s. The transport subscription
//! backing it is held while at least one subscription is alive and released when the
//! last one is dropped. From then on the observable is drained and every further
//! `attach` fails with [`CommError::ResubscriptionNotSupported`].

use crate::data_plane::ingress_hub::{HubRegistration, InboundMessage, IngressHub};
use crate::data_plane::subscription_registry::{SubscriptionLease, SubscriptionRegistry};
use crate::error::CommError;
use crate::observability::events;
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

const COMPONENT: &str = "observable";

/// Turns one incoming message into an item, or `None` to skip it.
pub(crate) type Decoder<T> = Arc<dyn Fn(&InboundMessage) -> Option<T> + Send + Sync>;

type BoxedStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// The queue of one consumer, fed by a sink registered with the hub.
struct Feed<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    /// Items queued and not yet taken by the consumer.
    backlog: Arc<AtomicUsize>,
    registration: HubRegistration,
}

struct ObservableState<T> {
    consumers: usize,
    drained: bool,
    lease: Option<SubscriptionLease>,
    /// Feed opened before the first attach so nothing published in between is lost.
    primed: Option<Feed<T>>,
}

struct ObservableShared<T> {
    label: String,
    lazy_topic: Option<String>,
    hub: Arc<IngressHub>,
    registry: Arc<SubscriptionRegistry>,
    decoder: Decoder<T>,
    state: Mutex<ObservableState<T>>,
}

impl<T: Send + 'static> ObservableShared<T> {
    fn lock(&self) -> MutexGuard<'_, ObservableState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a sink that decodes on arrival and queues only accepted items.
    fn open_feed(&self) -> Feed<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        let queued = backlog.clone();
        let decoder = self.decoder.clone();
        let label = self.label.clone();
        let warn_every = self.hub.backlog_warning();
        let registration = self.hub.register(Arc::new(move |message: &InboundMessage| {
            if sender.is_closed() {
                return false;
            }
            let Some(item) = decoder(message) else {
                return true;
            };
            let pending = queued.fetch_add(1, Ordering::Relaxed) + 1;
            if pending % warn_every == 0 {
                warn!(
                    event = events::DISPATCH_BACKLOG_HIGH,
                    component = COMPONENT,
                    observable = label.as_str(),
                    pending,
                    "event stream consumer is falling behind"
                );
            }
            sender.send(item).is_ok()
        }));
        Feed {
            receiver,
            backlog,
            registration,
        }
    }
}

/// A lazily activated, multi-consumer event stream source.
pub struct EventObservable<T> {
    shared: Arc<ObservableShared<T>>,
}

impl<T> Clone for EventObservable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + 'static> EventObservable<T> {
    /// Subscribes `topic` on the first attach.
    pub(crate) fn lazy(
        topic: String,
        hub: Arc<IngressHub>,
        registry: Arc<SubscriptionRegistry>,
        decoder: Decoder<T>,
    ) -> Self {
        Self::build(topic.clone(), Some(topic), hub, registry, decoder)
    }

    /// Subscribes `topic` immediately and buffers from now on, before any attach.
    pub(crate) fn eager(
        topic: String,
        hub: Arc<IngressHub>,
        registry: Arc<SubscriptionRegistry>,
        decoder: Decoder<T>,
    ) -> Self {
        let observable = Self::build(topic.clone(), None, hub, registry, decoder);
        let primed = observable.shared.open_feed();
        let lease = observable.shared.registry.acquire(&topic);
        {
            let mut state = observable.shared.lock();
            state.primed = Some(primed);
            state.lease = Some(lease);
        }
        observable
    }

    /// Transport subscriptions are owned elsewhere; only consumer counting applies.
    pub(crate) fn unmanaged(
        label: String,
        hub: Arc<IngressHub>,
        registry: Arc<SubscriptionRegistry>,
        decoder: Decoder<T>,
    ) -> Self {
        Self::build(label, None, hub, registry, decoder)
    }

    fn build(
        label: String,
        lazy_topic: Option<String>,
        hub: Arc<IngressHub>,
        registry: Arc<SubscriptionRegistry>,
        decoder: Decoder<T>,
    ) -> Self {
        Self {
            shared: Arc::new(ObservableShared {
                label,
                lazy_topic,
                hub,
                registry,
                decoder,
                state: Mutex::new(ObservableState {
                    consumers: 0,
                    drained: false,
                    lease: None,
                    primed: None,
                }),
            }),
        }
    }

    /// Attaches a new consumer.
    pub fn attach(&self) -> Result<EventSubscription<T>, CommError> {
        let feed = {
            let mut state = self.shared.lock();
            if state.drained {
                return Err(CommError::ResubscriptionNotSupported);
            }
            let feed = match state.primed.take() {
                Some(feed) => feed,
                None => self.shared.open_feed(),
            };
            if state.lease.is_none() {
                if let Some(topic) = &self.shared.lazy_topic {
                    state.lease = Some(self.shared.registry.acquire(topic));
                }
            }
            state.consumers += 1;
            feed
        };

        let Feed {
            receiver,
            backlog,
            registration,
        } = feed;
        let inner = UnboundedReceiverStream::new(receiver).map(move |item| {
            backlog.fetch_sub(1, Ordering::Relaxed);
            item
        });

        Ok(EventSubscription {
            inner: Box::pin(inner),
            _registration: registration,
            _consumer: ConsumerGuard {
                shared: self.shared.clone(),
            },
        })
    }

    pub fn is_drained(&self) -> bool {
        self.shared.lock().drained
    }

    pub fn consumer_count(&self) -> usize {
        self.shared.lock().consumers
    }
}

struct ConsumerGuard<T> {
    shared: Arc<ObservableShared<T>>,
}

impl<T> Drop for ConsumerGuard<T> {
    fn drop(&mut self) {
        let released = {
            let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.consumers -= 1;
            if state.consumers > 0 {
                return;
            }
            state.drained = true;
            debug!(
                event = events::OBSERVABLE_DRAINED,
                component = COMPONENT,
                observable = self.shared.label.as_str(),
                "last consumer detached"
            );
            (state.lease.take(), state.primed.take())
        };
        drop(released);
    }
}

/// One attached consumer of an [`EventObservable`]. Dropping it detaches.
pub struct EventSubscription<T> {
    inner: BoxedStream<T>,
    _registration: HubRegistration,
    _consumer: ConsumerGuard<T>,
}

impl<T> Stream for EventSubscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.inner.as_mut().poll_next(cx)
    }
}
