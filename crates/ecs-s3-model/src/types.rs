//! Lifecycle rule and bucket types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Whether a lifecycle rule is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RuleStatus {
    /// The rule is applied.
    #[default]
    Enabled,
    /// The rule is kept but not applied.
    Disabled,
}

impl RuleStatus {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enabled" => Ok(Self::Enabled),
            "Disabled" => Ok(Self::Disabled),
            _ => Err(ParseEnumError::new("rule status", s)),
        }
    }
}

/// The expiration action of a lifecycle rule.
///
/// Exactly one form applies to a rule, which the enum makes impossible to get wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// Expire objects this many days after creation.
    Days(u32),
    /// Expire objects at a fixed date (midnight UTC by convention).
    Date(DateTime<Utc>),
    /// Remove delete markers left behind once every version of an object has expired.
    ExpiredObjectDeleteMarker,
}

impl Expiration {
    /// Pick one expiration form out of loosely specified options.
    ///
    /// The delete-marker flag wins over `days`, which wins over `date`.
    /// Returns `None` when nothing was requested.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecs_s3_model::Expiration;
    ///
    /// assert_eq!(
    ///     Expiration::from_parts(Some(30), None, true),
    ///     Some(Expiration::ExpiredObjectDeleteMarker)
    /// );
    /// assert_eq!(Expiration::from_parts(Some(30), None, false), Some(Expiration::Days(30)));
    /// assert_eq!(Expiration::from_parts(None, None, false), None);
    /// ```
    #[must_use]
    pub fn from_parts(
        days: Option<u32>,
        date: Option<DateTime<Utc>>,
        expired_object_delete_marker: bool,
    ) -> Option<Self> {
        if expired_object_delete_marker {
            Some(Self::ExpiredObjectDeleteMarker)
        } else if let Some(days) = days {
            Some(Self::Days(days))
        } else {
            date.map(Self::Date)
        }
    }
}

/// Object filter of a lifecycle rule. An empty filter matches every object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFilter {
    /// Key prefix the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Filter criteria this client does not model (`Tag`, `And`, size bounds), as raw XML.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserved_elements: Vec<String>,
}

impl RuleFilter {
    /// True when the filter matches every object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.preserved_elements.is_empty()
    }
}

/// A single lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    /// Rule identifier, unique within a document by convention only.
    pub id: String,
    /// Whether the server applies the rule.
    pub status: RuleStatus,
    /// Objects the rule applies to.
    pub filter: RuleFilter,
    /// `None` for rules written by other tools that only carry other actions.
    pub expiration: Option<Expiration>,
    /// `<Expiration>` children this client does not model, as raw XML.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expiration_preserved_elements: Vec<String>,
    /// Accepted for bookkeeping; never written to or read from the server document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Child elements this client does not model (transitions, noncurrent
    /// version actions, ...), kept as raw XML so they survive a rewrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preserved_elements: Vec<String>,
}

impl LifecycleRule {
    /// Create an enabled rule with an empty filter.
    #[must_use]
    pub fn new(id: impl Into<String>, expiration: Expiration) -> Self {
        Self {
            id: id.into(),
            expiration: Some(expiration),
            ..Self::default()
        }
    }

    /// Restrict the rule to keys starting with `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filter.prefix = Some(prefix.into());
        self
    }

    /// Set the rule status.
    #[must_use]
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach a bookkeeping tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// What `upsert` does when a rule with the same id already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertPolicy {
    /// Always append, possibly creating duplicate ids.
    Append,
    /// Replace the first rule with the same id in place, append otherwise.
    #[default]
    Replace,
}

impl UpsertPolicy {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for UpsertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpsertPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            _ => Err(ParseEnumError::new("upsert policy", s)),
        }
    }
}

/// Bucket versioning state as written to `?versioning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// New versions are kept.
    Enabled,
    /// Versioning was turned off after having been enabled.
    Suspended,
}

impl VersioningStatus {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for VersioningStatus {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Suspended
        }
    }
}

/// Body of `GET`/`PUT /{bucket}?versioning`.
///
/// `status` is `None` for buckets on which versioning was never configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersioningConfiguration {
    /// Current state, if any.
    pub status: Option<VersioningStatus>,
}

/// Read-only bucket summary assembled from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMetadata {
    /// Bucket name.
    pub name: String,
    /// Namespace the bucket was looked up in.
    pub namespace: String,
    /// Whether versioning is enabled; `None` when the state could not be read.
    pub versioning_enabled: Option<bool>,
    /// Raw `Date` header of the `HEAD` response.
    pub creation_date: Option<String>,
    /// Object count as reported by `x-emc-meta-object-count`.
    pub object_count: u64,
    /// Storage size as reported by `x-emc-meta-storage-size`.
    pub storage_size: u64,
}
