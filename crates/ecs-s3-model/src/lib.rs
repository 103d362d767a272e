//! Model types for the ECS S3 client.
//!
//! Lifecycle rules are typed: the expiration action is an enum over its three
//! forms, so a rule can never carry both a day count and a delete-marker flag.
//! [`LifecycleDocument`] holds an ordered list of rules and implements the
//! structural edits (upsert by id, remove by id) independently of the wire format.

pub mod error;
pub mod lifecycle;
pub mod types;

pub use error::ParseEnumError;
pub use lifecycle::{LifecycleDocument, UpsertOutcome};
pub use types::{
    BucketMetadata, Expiration, LifecycleRule, RuleFilter, RuleStatus, UpsertPolicy,
    VersioningConfiguration, VersioningStatus,
};
