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

//! Transport wildcard matching and raw-topic validation.

use crate::routing::topic::{
    MULTI_LEVEL_WILDCARD, PROTOCOL_VERSION_TOKEN, SINGLE_LEVEL_WILDCARD, TOPIC_LEVEL_SEPARATOR,
};

/// A concrete topic that may be published on.
pub fn is_valid_publication_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['\0', '#', '+'])
}

/// A subscription filter: `+` must fill a whole level, `#` must be the whole last level.
pub fn is_valid_subscription_topic(filter: &str) -> bool {
    if filter.is_empty() || filter.contains('\0') {
        return false;
    }
    let levels: Vec<&str> = filter.split(TOPIC_LEVEL_SEPARATOR).collect();
    let last = levels.len() - 1;
    levels.iter().enumerate().all(|(index, level)| {
        if level.contains('#') {
            return *level == MULTI_LEVEL_WILDCARD && index == last;
        }
        !level.contains('+') || *level == SINGLE_LEVEL_WILDCARD
    })
}

/// True for topics in the structured protocol space, which raw passthrough may not use.
pub(crate) fn is_protocol_topic(topic: &str) -> bool {
    let first_level = topic.split(TOPIC_LEVEL_SEPARATOR).next().unwrap_or_default();
    first_level == PROTOCOL_VERSION_TOKEN
        || first_level == SINGLE_LEVEL_WILDCARD
        || first_level == MULTI_LEVEL_WILDCARD
}

/// Matches a concrete topic against a subscription filter.
///
/// `+` matches exactly one level, `#` matches zero or more trailing levels.
pub fn topic_matches(topic: &str, filter: &str) -> bool {
    let mut topic_levels = topic.split(TOPIC_LEVEL_SEPARATOR);
    let mut filter_levels = filter.split(TOPIC_LEVEL_SEPARATOR);

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some(MULTI_LEVEL_WILDCARD), _) => return true,
            (Some(SINGLE_LEVEL_WILDCARD), Some(_)) => continue,
            (Some(filter_level), Some(topic_level)) if filter_level == topic_level => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_level_wildcard_matches_exactly_one_level() {
        assert!(topic_matches("a/b/c", "a/+/c"));
        assert!(topic_matches("a//c", "a/+/c"));
        assert!(!topic_matches("a/c", "a/+/c"));
        assert!(!topic_matches("a/b/x/c", "a/+/c"));
    }

    #[test]
    fn multi_level_wildcard_matches_trailing_levels() {
        assert!(topic_matches("a", "a/#"));
        assert!(topic_matches("a/b/c", "a/#"));
        assert!(topic_matches("anything/at/all", "#"));
        assert!(!topic_matches("b/c", "a/#"));
    }

    #[test]
    fn literal_filters_require_equality() {
        assert!(topic_matches("sensors/temp", "sensors/temp"));
        assert!(!topic_matches("sensors/temp", "sensors/temp/x"));
        assert!(!topic_matches("sensors/temp/x", "sensors/temp"));
    }

    #[test]
    fn subscription_topic_validation() {
        assert!(is_valid_subscription_topic("a/+/c"));
        assert!(is_valid_subscription_topic("a/#"));
        assert!(is_valid_subscription_topic("#"));
        assert!(!is_valid_subscription_topic("a/#/c"));
        assert!(!is_valid_subscription_topic("a/b#"));
        assert!(!is_valid_subscription_topic("a/b+/c"));
        assert!(!is_valid_subscription_topic(""));
        assert!(!is_valid_subscription_topic("a/\0"));
    }

    #[test]
    fn publication_topic_validation() {
        assert!(is_valid_publication_topic("sensors/temp"));
        assert!(!is_valid_publication_topic("sensors/+"));
        assert!(!is_valid_publication_topic("sensors/#"));
        assert!(!is_valid_publication_topic(""));
    }

    #[test]
    fn protocol_topics_are_detected() {
        assert!(is_protocol_topic("v1/-/ADV:Log/+"));
        assert!(is_protocol_topic("#"));
        assert!(is_protocol_topic("+/x"));
        assert!(!is_protocol_topic("sensors/v1"));
    }
}
