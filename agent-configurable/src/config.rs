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

use agent_comm::{CommunicationOptions, CoreType};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    pub(crate) communication: CommunicationOptions,
    #[serde(default)]
    pub(crate) observe: ObserveConfig,
    /// Extra agents started on the same loopback broker, so there is traffic to observe.
    #[serde(default)]
    pub(crate) peers: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ObserveConfig {
    #[serde(default)]
    pub(crate) core_types: Vec<CoreType>,
    #[serde(default)]
    pub(crate) object_types: Vec<String>,
    #[serde(default)]
    pub(crate) channels: Vec<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config = json5::from_str(contents)?;
        config.communication.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_default_config_parses() {
        let config = Config::parse(include_str!("../DEFAULT_CONFIG.json5")).unwrap();
        assert_eq!(config.communication.namespace, "plant-1");
        assert_eq!(config.communication.io_nodes[0].io_actors.len(), 1);
        assert_eq!(config.observe.core_types[0], CoreType::Identity);
        assert_eq!(config.peers.len(), 2);
    }

    #[test]
    fn invalid_options_are_rejected_at_load() {
        let parsed = Config::parse(r#"{ communication: { namespace: "a/b" } }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let parsed = Config::parse(r#"{ communication: {}, transports: {} }"#);
        assert!(parsed.is_err());
    }
}
