//! Shared data model for the value-profile-directed constraint-injection
//! pipeline: observation records, site keys, and the Limited-Value Map.
//!
//! This crate has no I/O beyond loading/saving the map as JSON and does
//! not depend on any of the other four crates in the workspace — both
//! the native-execution side (`vase-sink`, `vase-instrument`) and the
//! symbolic-execution side (`vase-distill`, `vase-wrapper`) build on it.

mod config;
mod map;
mod record;
mod site;

pub use config::{DistillerParams, WrapperLimits};
pub use map::{LimitedValueMap, ValueProperty, TYPE_TAG_INTEGER};
pub use record::{ObservationRecord, RecordParseError, ENTRY_BRANCH};
pub use site::{SiteKey, SiteKeyError};
