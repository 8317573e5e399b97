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

//! Runtime integration layer.
//!
//! Long-running tasks spawned by the lifecycle controller: the single transport
//! worker that serializes every outbound call, the ingress pump feeding the hub
//! from the transport, and the connection watch reacting to online/offline
//! transitions. Nothing here decides routing policy.

pub(crate) mod connection_watch;
pub(crate) mod ingress_pump;
pub(crate) mod transport_worker;
