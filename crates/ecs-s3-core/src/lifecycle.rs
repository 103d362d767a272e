//! Lifecycle reconciliation against the server document.
//!
//! The server keeps a bucket's lifecycle configuration as one XML document.
//! There is no API to edit a single rule, so every write is a read-modify-write
//! cycle:
//!
//! 1. `GET /{bucket}?lifecycle`. A 404 means no document yet and yields an
//!    empty [`LifecycleDocument`]; any other non-2xx status is an error.
//! 2. Edit the document in memory (upsert or remove).
//! 3. Serialize it and attach `Content-MD5`, `Content-Type` and `Content-Length`.
//! 4. `PUT /{bucket}?lifecycle` with the whole document.
//!
//! # Concurrent writers
//!
//! The cycle is **not** isolated. Two clients editing the same bucket at the
//! same time both read the same document, and the second `PUT` silently
//! discards the first client's change. The server offers no transaction, so
//! with the default [`WriteMode::LastWriteWins`] this race is left as is.
//!
//! [`WriteMode::IfMatch`] turns the `PUT` into a conditional write on the
//! ETag returned by the `GET` (`If-None-Match: *` when there was no document).
//! A server that honors the precondition answers 412, reported as
//! [`ClientError::PreconditionFailed`]. Nothing is retried.

use bytes::Bytes;
use chrono::{DateTime, Months, NaiveTime, Utc};
use http::header::{ETAG, HeaderValue, IF_MATCH, IF_NONE_MATCH};
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ecs_s3_auth::Resource;
use ecs_s3_model::{Expiration, LifecycleDocument, LifecycleRule, UpsertOutcome};
use ecs_s3_xml::{parse_lifecycle, serialize_lifecycle};

use crate::checksums::xml_body_headers;
use crate::client::EcsClient;
use crate::config::WriteMode;
use crate::error::ClientError;

const LIFECYCLE: &str = "?lifecycle";

/// Result of applying one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Rule id.
    pub id: String,
    /// Whether the rule was appended or replaced an existing one.
    pub outcome: UpsertOutcome,
}

/// Result of removing a rule. A missing rule is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RemoveOutcome {
    /// The rule was removed and the document written back.
    Removed {
        /// Rule id.
        id: String,
    },
    /// No rule had this id; nothing was written.
    NotFound {
        /// Rule id.
        id: String,
    },
}

/// The document as read, plus what a conditional write needs.
#[derive(Debug)]
struct Snapshot {
    document: LifecycleDocument,
    etag: Option<HeaderValue>,
    existed: bool,
}

/// Lifecycle operations.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    client: EcsClient,
    namespace: Option<String>,
}

impl LifecycleManager {
    /// Create a manager working in the client's configured namespace.
    #[must_use]
    pub fn new(client: EcsClient) -> Self {
        Self {
            client,
            namespace: None,
        }
    }

    /// A manager whose requests target `namespace` instead of the configured one.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Fetch and parse the bucket's lifecycle document.
    ///
    /// A 404 or an empty body yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for non-2xx statuses other
    /// than 404 and [`ClientError::MalformedDocument`] for unparsable bodies.
    pub async fn get_lifecycle(&self, bucket: &str) -> Result<LifecycleDocument, ClientError> {
        Ok(self.fetch(bucket).await?.document)
    }

    /// Rule ids in document order.
    ///
    /// # Errors
    ///
    /// Same as [`get_lifecycle`](Self::get_lifecycle).
    pub async fn list_rules(&self, bucket: &str) -> Result<Vec<String>, ClientError> {
        let document = self.get_lifecycle(bucket).await?;
        Ok(document.rule_ids().into_iter().map(str::to_owned).collect())
    }

    /// Insert `rule` using the configured upsert policy and write the document back.
    ///
    /// # Errors
    ///
    /// Propagates read, serialization and write failures.
    pub async fn apply_rule(
        &self,
        bucket: &str,
        rule: LifecycleRule,
    ) -> Result<ApplyOutcome, ClientError> {
        let policy = self.client.config().upsert_policy;
        let mut snapshot = self.fetch(bucket).await?;
        let id = rule.id.clone();
        let outcome = snapshot.document.upsert(rule, policy);

        info!(
            bucket,
            rule = %id,
            rules = snapshot.document.len(),
            %policy,
            "writing lifecycle configuration"
        );
        self.store(bucket, &snapshot).await?;
        Ok(ApplyOutcome { id, outcome })
    }

    /// Insert several rules in a single read-modify-write cycle.
    ///
    /// An empty `rules` list sends no request.
    ///
    /// # Errors
    ///
    /// Propagates read, serialization and write failures.
    pub async fn apply_rules(
        &self,
        bucket: &str,
        rules: Vec<LifecycleRule>,
    ) -> Result<Vec<ApplyOutcome>, ClientError> {
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let policy = self.client.config().upsert_policy;
        let mut snapshot = self.fetch(bucket).await?;
        let outcomes = rules
            .into_iter()
            .map(|rule| {
                let id = rule.id.clone();
                let outcome = snapshot.document.upsert(rule, policy);
                ApplyOutcome { id, outcome }
            })
            .collect::<Vec<_>>();

        info!(
            bucket,
            rules = snapshot.document.len(),
            applied = outcomes.len(),
            %policy,
            "writing lifecycle configuration"
        );
        self.store(bucket, &snapshot).await?;
        Ok(outcomes)
    }

    /// Remove the first rule with `id` and write the document back.
    ///
    /// When no rule matches, nothing is written and
    /// [`RemoveOutcome::NotFound`] is returned.
    ///
    /// # Errors
    ///
    /// Propagates read, serialization and write failures.
    pub async fn remove_rule(&self, bucket: &str, id: &str) -> Result<RemoveOutcome, ClientError> {
        let mut snapshot = self.fetch(bucket).await?;
        if !snapshot.document.remove(id) {
            return Ok(RemoveOutcome::NotFound { id: id.to_owned() });
        }

        info!(
            bucket,
            rule = id,
            rules = snapshot.document.len(),
            "writing lifecycle configuration"
        );
        self.store(bucket, &snapshot).await?;
        Ok(RemoveOutcome::Removed { id: id.to_owned() })
    }

    /// `DELETE /{bucket}?lifecycle`: drop every rule at once.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response.
    pub async fn delete_lifecycle(&self, bucket: &str) -> Result<(), ClientError> {
        self.client
            .execute_ok(
                Method::DELETE,
                &Resource::bucket(bucket).with_subresource(LIFECYCLE),
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;
        info!(bucket, "lifecycle configuration deleted");
        Ok(())
    }

    /// Replace the lifecycle document with a caller-provided body, sent verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response.
    pub async fn put_lifecycle_xml(&self, bucket: &str, body: Bytes) -> Result<(), ClientError> {
        let headers = xml_body_headers(&body)?;
        self.client
            .execute_ok(
                Method::PUT,
                &Resource::bucket(bucket).with_subresource(LIFECYCLE),
                headers,
                body,
                self.namespace.as_deref(),
            )
            .await?;
        info!(bucket, "lifecycle configuration replaced");
        Ok(())
    }

    async fn fetch(&self, bucket: &str) -> Result<Snapshot, ClientError> {
        let resource = Resource::bucket(bucket).with_subresource(LIFECYCLE);
        let response = self
            .client
            .execute(
                Method::GET,
                &resource,
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            warn!(
                bucket,
                "no lifecycle configuration, starting from an empty document"
            );
            return Ok(Snapshot {
                document: LifecycleDocument::new(),
                etag: None,
                existed: false,
            });
        }
        if !response.status.is_success() {
            return Err(self.client.failure(Method::GET, &resource, &response));
        }

        let document = parse_lifecycle(&response.body).map_err(ClientError::MalformedDocument)?;
        Ok(Snapshot {
            document,
            etag: response.headers.get(ETAG).cloned(),
            existed: true,
        })
    }

    async fn store(&self, bucket: &str, snapshot: &Snapshot) -> Result<(), ClientError> {
        let body = serialize_lifecycle(&snapshot.document).map_err(ClientError::Serialize)?;
        let mut headers = xml_body_headers(&body)?;

        if self.client.config().write_mode == WriteMode::IfMatch {
            match (&snapshot.etag, snapshot.existed) {
                (Some(etag), _) => {
                    headers.insert(IF_MATCH, etag.clone());
                }
                (None, false) => {
                    headers.insert(IF_NONE_MATCH, HeaderValue::from_static("*"));
                }
                (None, true) => {
                    warn!(bucket, "server sent no ETag, writing unconditionally");
                }
            }
        }

        let resource = Resource::bucket(bucket).with_subresource(LIFECYCLE);
        let response = self
            .client
            .execute(
                Method::PUT,
                &resource,
                headers,
                Bytes::from(body),
                self.namespace.as_deref(),
            )
            .await?;

        if response.status == StatusCode::PRECONDITION_FAILED {
            return Err(ClientError::PreconditionFailed {
                bucket: bucket.to_owned(),
            });
        }
        if !response.status.is_success() {
            return Err(self.client.failure(Method::PUT, &resource, &response));
        }
        Ok(())
    }
}

/// Date-expiration rules for each prefix, as used by `lifecycle batch`.
///
/// Rule ids are derived from the prefix (`logs/2024` gives `expire-logs-2024`).
#[must_use]
pub fn date_rules_for_prefixes(prefixes: &[String], date: DateTime<Utc>) -> Vec<LifecycleRule> {
    prefixes
        .iter()
        .map(|prefix| {
            LifecycleRule::new(rule_id_for_prefix(prefix), Expiration::Date(date))
                .with_prefix(prefix.clone())
        })
        .collect()
}

/// Midnight UTC, `years` years after `now`.
///
/// Returns `None` if the date is out of range.
#[must_use]
pub fn expiration_date_after_years(now: DateTime<Utc>, years: u32) -> Option<DateTime<Utc>> {
    let date = now
        .date_naive()
        .checked_add_months(Months::new(years.checked_mul(12)?))?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

fn rule_id_for_prefix(prefix: &str) -> String {
    let slug = prefix
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "expire-all".to_owned()
    } else {
        format!("expire-{slug}")
    }
}
