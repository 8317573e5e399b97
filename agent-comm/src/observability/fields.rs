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

//! Canonical structured field keys and value-format helpers.

use crate::transport::Payload;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const TOPIC: &str = "topic";
pub const REF_COUNT: &str = "ref_count";
pub const QUEUE_LEN: &str = "queue_len";
pub const PAYLOAD_LEN: &str = "payload_len";
pub const SOURCE_ID: &str = "source_id";
pub const CORRELATION_ID: &str = "correlation_id";
pub const IO_SOURCE_ID: &str = "io_source_id";
pub const IO_ACTOR_ID: &str = "io_actor_id";
pub const ROUTE: &str = "route";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_NOT_ASSOCIATED: &str = "not_associated";
pub const REASON_NOT_OWNED: &str = "not_owned";
pub const REASON_BROADCAST_CLOSED: &str = "broadcast_closed";

pub fn format_optional_str(value: Option<&str>) -> String {
    value.unwrap_or(NONE).to_string()
}

pub fn format_payload_kind(payload: &Payload) -> &'static str {
    match payload {
        Payload::Text(_) => "text",
        Payload::Binary(_) => "binary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_format_as_none() {
        assert_eq!(format_optional_str(None), NONE);
        assert_eq!(format_optional_str(Some("route")), "route");
    }

    #[test]
    fn payload_kind_reflects_variant() {
        assert_eq!(format_payload_kind(&Payload::from("x")), "text");
        assert_eq!(format_payload_kind(&Payload::from(vec![1u8])), "binary");
    }
}
