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

//! Data-plane layer.
//!
//! Reference-counted transport subscriptions, the offline outbound queue, the
//! ingress fan-out hub, lazily activated observables and request/response
//! correlation. The dispatcher ties them together behind typed publish/observe
//! calls used by the manager facade.

pub(crate) mod dispatcher;
pub(crate) mod ingress_hub;
pub(crate) mod observable;
pub(crate) mod outbound_queue;
pub(crate) mod request_correlator;
pub(crate) mod subscription_registry;
