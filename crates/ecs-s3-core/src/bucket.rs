//! Bucket operations: create, versioning, metadata, delete.
//!
//! Each operation is a single sign, send, check chain with no read-modify-write step.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ecs_s3_auth::Resource;
use ecs_s3_model::{BucketMetadata, VersioningConfiguration, VersioningStatus};
use ecs_s3_xml::{VERSIONING_ROOT, parse_versioning, to_xml};

use crate::checksums::xml_body_headers;
use crate::client::EcsClient;
use crate::error::ClientError;

const VERSIONING: &str = "?versioning";
const OBJECT_COUNT_HEADER: &str = "x-emc-meta-object-count";
const STORAGE_SIZE_HEADER: &str = "x-emc-meta-storage-size";

/// What [`BucketManager::update_bucket`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "versioning", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Nothing was requested; no request was sent.
    Unchanged,
    /// The versioning state was written.
    Versioning(VersioningStatus),
}

/// Bucket operations.
#[derive(Debug, Clone)]
pub struct BucketManager {
    client: EcsClient,
    namespace: Option<String>,
}

impl BucketManager {
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

    fn namespace(&self) -> &str {
        self.namespace
            .as_deref()
            .unwrap_or_else(|| self.client.authority().default_namespace())
    }

    /// `PUT /{bucket}`, then enable versioning when asked to.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response.
    pub async fn create_bucket(&self, bucket: &str, versioning: bool) -> Result<(), ClientError> {
        self.client
            .execute_ok(
                Method::PUT,
                &Resource::bucket(bucket),
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;
        info!(bucket, namespace = self.namespace(), "bucket created");

        if versioning {
            self.put_versioning(bucket, VersioningStatus::Enabled)
                .await?;
        }
        Ok(())
    }

    /// Set the versioning state; `None` changes nothing and sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response.
    pub async fn update_bucket(
        &self,
        bucket: &str,
        versioning: Option<bool>,
    ) -> Result<UpdateOutcome, ClientError> {
        match versioning {
            Some(enabled) => {
                let status = VersioningStatus::from(enabled);
                self.put_versioning(bucket, status).await?;
                Ok(UpdateOutcome::Versioning(status))
            }
            None => Ok(UpdateOutcome::Unchanged),
        }
    }

    /// `GET /{bucket}?versioning`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response and
    /// [`ClientError::MalformedDocument`] for an unparsable body.
    pub async fn get_versioning(
        &self,
        bucket: &str,
    ) -> Result<VersioningConfiguration, ClientError> {
        let response = self
            .client
            .execute_ok(
                Method::GET,
                &Resource::bucket(bucket).with_subresource(VERSIONING),
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;
        parse_versioning(&response.body).map_err(ClientError::MalformedDocument)
    }

    /// Read bucket metadata from `HEAD /{bucket}` and the versioning state.
    ///
    /// Returns `None` when the bucket does not exist. Object count and storage
    /// size headers that are absent or not numeric read as zero. A failed
    /// versioning read leaves `versioning_enabled` unset instead of failing the
    /// whole call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for non-2xx responses other
    /// than a 404 on the `HEAD`.
    pub async fn get_bucket_info(
        &self,
        bucket: &str,
    ) -> Result<Option<BucketMetadata>, ClientError> {
        let resource = Resource::bucket(bucket);
        let head = self
            .client
            .execute(
                Method::HEAD,
                &resource,
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;

        if head.status == StatusCode::NOT_FOUND {
            warn!(bucket, "bucket not found");
            return Ok(None);
        }
        if !head.status.is_success() {
            return Err(self.client.failure(Method::HEAD, &resource, &head));
        }

        let versioning_enabled = match self.get_versioning(bucket).await {
            Ok(versioning) => Some(versioning.status == Some(VersioningStatus::Enabled)),
            Err(err) => {
                warn!(bucket, %err, "could not read versioning state");
                None
            }
        };

        Ok(Some(BucketMetadata {
            name: bucket.to_owned(),
            namespace: self.namespace().to_owned(),
            versioning_enabled,
            creation_date: head.header_str("date").map(str::to_owned),
            object_count: numeric_header(head.header_str(OBJECT_COUNT_HEADER)),
            storage_size: numeric_header(head.header_str(STORAGE_SIZE_HEADER)),
        }))
    }

    /// `DELETE /{bucket}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RemoteRequestFailed`] for any non-2xx response,
    /// e.g. when the bucket is not empty.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<(), ClientError> {
        self.client
            .execute_ok(
                Method::DELETE,
                &Resource::bucket(bucket),
                HeaderMap::new(),
                Bytes::new(),
                self.namespace.as_deref(),
            )
            .await?;
        info!(bucket, namespace = self.namespace(), "bucket deleted");
        Ok(())
    }

    async fn put_versioning(
        &self,
        bucket: &str,
        status: VersioningStatus,
    ) -> Result<(), ClientError> {
        let body = to_xml(
            VERSIONING_ROOT,
            &VersioningConfiguration {
                status: Some(status),
            },
        )
        .map_err(ClientError::Serialize)?;
        let headers = xml_body_headers(&body)?;

        self.client
            .execute_ok(
                Method::PUT,
                &Resource::bucket(bucket).with_subresource(VERSIONING),
                headers,
                Bytes::from(body),
                self.namespace.as_deref(),
            )
            .await?;
        info!(bucket, versioning = %status, "bucket versioning updated");
        Ok(())
    }
}

fn numeric_header(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::transport::mock::{MockTransport, client_with, response, response_with_headers};

    const VERSIONING_ENABLED: &str = r#"<?xml version="1.0" encoding="UTF-8"?><VersioningConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Status>Enabled</Status></VersioningConfiguration>"#;

    fn manager(transport: &Arc<MockTransport>) -> BucketManager {
        client_with(transport).buckets()
    }

    #[tokio::test]
    async fn test_should_create_bucket_with_versioning() {
        let transport = Arc::new(MockTransport::with_responses([
            response(200, ""),
            response(200, ""),
        ]));

        manager(&transport)
            .create_bucket("logs", true)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url, "http://ecs.test:9020/logs");
        assert!(requests[0].body.is_empty());

        assert_eq!(requests[1].url, "http://ecs.test:9020/logs?versioning");
        let body = std::str::from_utf8(&requests[1].body).unwrap();
        assert!(body.ends_with(
            "<VersioningConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\"><Status>Enabled</Status></VersioningConfiguration>"
        ));
        assert_eq!(requests[1].headers["content-type"], "application/xml");
        assert!(requests[1].headers.contains_key("content-md5"));
    }

    #[tokio::test]
    async fn test_should_create_bucket_in_overridden_namespace() {
        let transport = Arc::new(MockTransport::with_responses([response(200, "")]));
        let buckets = manager(&transport);

        buckets
            .clone()
            .in_namespace("other")
            .create_bucket("logs", false)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].headers["x-emc-namespace"], "other");
        assert_eq!(buckets.namespace(), "ns1");
    }

    #[tokio::test]
    async fn test_should_stop_when_bucket_creation_fails() {
        let transport = Arc::new(MockTransport::with_responses([response(
            409,
            "<Error><Code>BucketAlreadyExists</Code><Message>taken</Message></Error>",
        )]));

        let err = manager(&transport)
            .create_bucket("logs", true)
            .await
            .unwrap_err();

        assert_eq!(err.error_code().as_deref(), Some("BucketAlreadyExists"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_should_suspend_versioning_on_update() {
        let transport = Arc::new(MockTransport::with_responses([response(200, "")]));

        let outcome = manager(&transport)
            .update_bucket("logs", Some(false))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::Versioning(VersioningStatus::Suspended)
        );
        let body = std::str::from_utf8(&transport.requests()[0].body)
            .unwrap()
            .to_owned();
        assert!(body.contains("<Status>Suspended</Status>"));
    }

    #[tokio::test]
    async fn test_should_send_nothing_for_empty_update() {
        let transport = Arc::new(MockTransport::default());

        let outcome = manager(&transport)
            .update_bucket("logs", None)
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_should_read_bucket_info_from_headers() {
        let transport = Arc::new(MockTransport::with_responses([
            response_with_headers(
                200,
                "",
                &[
                    ("date", "Mon, 19 Oct 2026 12:00:00 GMT"),
                    (OBJECT_COUNT_HEADER, "42"),
                    (STORAGE_SIZE_HEADER, "not-a-number"),
                ],
            ),
            response(200, VERSIONING_ENABLED),
        ]));

        let info = manager(&transport)
            .get_bucket_info("logs")
            .await
            .unwrap()
            .expect("bucket exists");

        assert_eq!(info.name, "logs");
        assert_eq!(info.namespace, "ns1");
        assert_eq!(info.versioning_enabled, Some(true));
        assert_eq!(
            info.creation_date.as_deref(),
            Some("Mon, 19 Oct 2026 12:00:00 GMT")
        );
        assert_eq!(info.object_count, 42);
        assert_eq!(info.storage_size, 0);

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::HEAD);
        assert_eq!(requests[1].url, "http://ecs.test:9020/logs?versioning");
    }

    #[tokio::test]
    async fn test_should_report_unknown_versioning_when_read_fails() {
        let transport = Arc::new(MockTransport::with_responses([
            response_with_headers(200, "", &[(OBJECT_COUNT_HEADER, "7")]),
            response(500, "<Error><Code>InternalError</Code></Error>"),
        ]));

        let info = manager(&transport)
            .get_bucket_info("logs")
            .await
            .unwrap()
            .expect("bucket exists");

        assert_eq!(info.versioning_enabled, None);
        assert_eq!(info.object_count, 7);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_should_return_none_for_missing_bucket() {
        let transport = Arc::new(MockTransport::with_responses([response(404, "")]));

        let info = manager(&transport).get_bucket_info("ghost").await.unwrap();

        assert!(info.is_none());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_should_fail_bucket_info_on_forbidden() {
        let transport = Arc::new(MockTransport::with_responses([response(403, "")]));

        let err = manager(&transport)
            .get_bucket_info("logs")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_should_delete_bucket() {
        let transport = Arc::new(MockTransport::with_responses([response(204, "")]));

        manager(&transport).delete_bucket("logs").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(requests[0].url, "http://ecs.test:9020/logs");
    }

    #[test]
    fn test_should_serialize_update_outcome() {
        let outcome = UpdateOutcome::Versioning(VersioningStatus::Enabled);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["result"], "versioning");
        assert_eq!(json["versioning"], "Enabled");
        assert_eq!(
            serde_json::to_value(UpdateOutcome::Unchanged).unwrap()["result"],
            "unchanged"
        );
    }
}
