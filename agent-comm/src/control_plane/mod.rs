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

//! Control-plane layer.
//!
//! Owns the agent lifecycle (start/stop, last will, deadvertise, discover
//! responses) and the IO routing table that reacts to Associate events.
//!
//! ```
//! use agent_comm::{CommObject, CommunicationManager, CommunicationOptions, IoNode};
//! use loopback_transport::LoopbackBroker;
//! use std::sync::Arc;
//!
//! let source = CommObject::io_source("temperature", "json");
//! let node = IoNode::new("sensor").with_source(source.clone());
//! let options = CommunicationOptions::default().with_io_node(node.clone());
//! let transport = Arc::new(LoopbackBroker::new().client());
//! let manager = CommunicationManager::new(transport, options).unwrap();
//!
//! // Routes derive from the source id unless it carries an external route.
//! let route = manager.create_io_route(&source).unwrap();
//! assert!(route.ends_with(&source.object_id.to_string()));
//! assert_eq!(manager.get_io_node_by_context("sensor"), Some(&node));
//! ```

pub(crate) mod io_route_table;
pub(crate) mod io_router;
pub(crate) mod lifecycle;
