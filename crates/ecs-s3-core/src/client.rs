//! Shared request pipeline: sign, send, check.
//!
//! [`EcsClient`] pairs a [`RequestAuthority`] with a [`Transport`]. It is cheap
//! to clone and hands out the [`BucketManager`] and [`LifecycleManager`] that
//! implement the individual operations.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method};
use tracing::debug;

use ecs_s3_auth::{Credentials, RequestAuthority, Resource};

use crate::bucket::BucketManager;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::lifecycle::LifecycleManager;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Client for one ECS endpoint and set of credentials.
#[derive(Debug, Clone)]
pub struct EcsClient {
    authority: Arc<RequestAuthority>,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl EcsClient {
    /// Create a client over an explicit transport.
    #[must_use]
    pub fn new(
        authority: RequestAuthority,
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Self {
        Self {
            authority: Arc::new(authority),
            transport,
            config,
        }
    }

    /// Create a client using [`ReqwestTransport`] with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid settings and
    /// [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn connect(credentials: Credentials, config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport =
            ReqwestTransport::new(config.request_timeout()).map_err(ClientError::Transport)?;
        Ok(Self::new(
            RequestAuthority::new(credentials),
            Arc::new(transport),
            config,
        ))
    }

    /// The signing authority.
    #[must_use]
    pub fn authority(&self) -> &RequestAuthority {
        &self.authority
    }

    /// Behavioral settings.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Bucket operations in the configured namespace.
    #[must_use]
    pub fn buckets(&self) -> BucketManager {
        BucketManager::new(self.clone())
    }

    /// Lifecycle operations in the configured namespace.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleManager {
        LifecycleManager::new(self.clone())
    }

    /// Sign and send a request, returning the response whatever its status.
    pub(crate) async fn execute(
        &self,
        method: Method,
        resource: &Resource<'_>,
        headers: HeaderMap,
        body: Bytes,
        namespace: Option<&str>,
    ) -> Result<HttpResponse, ClientError> {
        let signed = self.authority.sign(&method, resource, &headers, namespace)?;
        let url = signed.url.clone();

        let response = self
            .transport
            .send(HttpRequest {
                method: signed.method,
                url: signed.url,
                headers: signed.headers,
                body,
            })
            .await
            .map_err(ClientError::Transport)?;

        debug!(%method, %url, status = response.status.as_u16(), "request completed");
        Ok(response)
    }

    /// Like [`execute`](Self::execute), but any non-2xx status is an error.
    pub(crate) async fn execute_ok(
        &self,
        method: Method,
        resource: &Resource<'_>,
        headers: HeaderMap,
        body: Bytes,
        namespace: Option<&str>,
    ) -> Result<HttpResponse, ClientError> {
        let response = self
            .execute(method.clone(), resource, headers, body, namespace)
            .await?;
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(self.failure(method, resource, &response))
        }
    }

    /// Build the error for a non-2xx response.
    pub(crate) fn failure(
        &self,
        method: Method,
        resource: &Resource<'_>,
        response: &HttpResponse,
    ) -> ClientError {
        ClientError::RemoteRequestFailed {
            method,
            url: self.authority.url_for(resource),
            status: response.status,
            body: response.body_text(),
        }
    }
}
