//! Canonical structured-logging vocabulary.
//!
//! Every `tracing` event in the crate carries `event = events::*` and
//! `component = <module>` so log pipelines can filter without parsing messages.

pub mod events;
pub mod fields;
