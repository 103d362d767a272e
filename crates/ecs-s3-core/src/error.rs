//! Client error types.
//!
//! [`ClientError`] is returned by every bucket and lifecycle operation. Signing
//! problems surface before any request is sent; transport failures are passed
//! through untouched so callers can apply their own retry policy.
//!
//! # Usage
//!
//! ```
//! use ecs_s3_core::error::ClientError;
//! use http::{Method, StatusCode};
//!
//! let err = ClientError::RemoteRequestFailed {
//!     method: Method::PUT,
//!     url: "https://ecs.example.com/logs?lifecycle".to_owned(),
//!     status: StatusCode::BAD_REQUEST,
//!     body: "<Error><Code>MalformedXML</Code><Message>bad</Message></Error>".to_owned(),
//! };
//! assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
//! assert_eq!(err.error_code().as_deref(), Some("MalformedXML"));
//! ```

use http::{Method, StatusCode};

use ecs_s3_auth::AuthError;
use ecs_s3_xml::{ErrorBody, XmlError};

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Errors returned by [`BucketManager`](crate::bucket::BucketManager) and
/// [`LifecycleManager`](crate::lifecycle::LifecycleManager).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be signed. Raised before any network activity.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The client configuration was rejected when the client was built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A non-empty lifecycle or versioning body could not be parsed.
    #[error("malformed document: {0}")]
    MalformedDocument(#[source] XmlError),

    /// A document could not be serialized.
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] XmlError),

    /// The server answered with a non-2xx status.
    #[error("{method} {url} failed with status {status}: {body}")]
    RemoteRequestFailed {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Response status.
        status: StatusCode,
        /// Response body, decoded lossily.
        body: String,
    },

    /// A conditional write was rejected because the document changed after it was read.
    #[error("lifecycle configuration of bucket {bucket} changed since it was read")]
    PreconditionFailed {
        /// Bucket whose document changed.
        bucket: String,
    },

    /// The transport failed to deliver the request or read the response.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
}

impl ClientError {
    /// HTTP status of a failed remote request, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RemoteRequestFailed { status, .. } => Some(*status),
            Self::PreconditionFailed { .. } => Some(StatusCode::PRECONDITION_FAILED),
            _ => None,
        }
    }

    /// Server error code (`NoSuchBucket`, `AccessDenied`, ...) parsed from the
    /// response body of a failed request.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        match self {
            Self::RemoteRequestFailed { body, .. } => {
                ErrorBody::parse(body.as_bytes()).map(|b| b.code)
            }
            _ => None,
        }
    }
}
