//! Topic codec layer.
//!
//! Pure functions that turn structured addresses into transport topics and back,
//! plus the wildcard matching used by raw passthrough. Every public observe/publish
//! entry point validates its inputs here before touching any shared state.
//!
//! ```
//! use agent_comm::{EventType, Topic};
//! use uuid::Uuid;
//!
//! let source_id = Uuid::new_v4();
//! let topic = Topic::one_way("-", EventType::Channel, Some("alerts"), source_id);
//! let encoded = topic.encode().unwrap();
//!
//! assert!(agent_comm::topic_matches(&encoded, "v1/-/CHN:alerts/+"));
//! assert_eq!(Topic::decode(&encoded).unwrap(), topic);
//! ```

pub(crate) mod event_type;
pub(crate) mod topic;
pub(crate) mod topic_filter;
