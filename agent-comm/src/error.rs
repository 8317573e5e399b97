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

//! Error taxonomy shared by every public observe/publish entry point.

use crate::transport::TransportError;
use thiserror::Error;

/// Failures surfaced by the communication core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommError {
    /// A topic-address input (namespace, filter, channel, operation, raw topic) or an
    /// event payload was malformed. Always reported synchronously to the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An incoming topic or payload could not be decoded.
    #[error("decoding failure: {0}")]
    DecodingFailure(String),

    /// Attaching to an event stream whose consumers have all detached.
    #[error("resubscription of a drained event stream is not supported")]
    ResubscriptionNotSupported,

    /// Malformed options handed to the manager at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A connect/disconnect request was rejected by the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CommError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        CommError::InvalidArgument(message.into())
    }

    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        CommError::DecodingFailure(message.into())
    }

    pub(crate) fn invalid_configuration(message: impl Into<String>) -> Self {
        CommError::InvalidConfiguration(message.into())
    }
}
