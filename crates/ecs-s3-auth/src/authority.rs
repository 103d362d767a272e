//! Request authority: URL composition and signing for one set of credentials.
//!
//! [`RequestAuthority`] owns the endpoint and credentials. For every call it
//! composes the final URL from a [`Resource`], injects the `x-emc-namespace`
//! header and delegates to [`sign_v2`](crate::sigv2::sign_v2).
//!
//! The namespace can be overridden per call. The override is an explicit
//! argument and never changes the authority itself, so one authority can be
//! shared between callers working in different namespaces.

use http::{HeaderMap, HeaderName, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::credentials::{AuthMethod, Credentials};
use crate::error::AuthError;
use crate::sigv2::{sign_v2, to_header_value};

/// Header carrying the ECS namespace on every request.
pub const NAMESPACE_HEADER: HeaderName = HeaderName::from_static("x-emc-namespace");

/// Characters left untouched when escaping object names.
///
/// Letters, digits and `-`, `_`, `.`, `~` pass through; everything else,
/// including `/`, is percent-encoded. Spaces are handled separately and become `+`.
const OBJECT_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The target of a request: the service root, a bucket, or an object, with an
/// optional subresource suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resource<'a> {
    /// Bucket name; empty addresses the service root.
    pub bucket: &'a str,
    /// Object name within the bucket.
    pub object_name: Option<&'a str>,
    /// Literal suffix appended to the URL, e.g. `?lifecycle`. Not encoded.
    pub subresource: Option<&'a str>,
}

impl<'a> Resource<'a> {
    /// The service root (`/`).
    #[must_use]
    pub fn service() -> Self {
        Self::default()
    }

    /// A bucket.
    #[must_use]
    pub fn bucket(bucket: &'a str) -> Self {
        Self {
            bucket,
            ..Self::default()
        }
    }

    /// An object inside a bucket.
    #[must_use]
    pub fn object(bucket: &'a str, object_name: &'a str) -> Self {
        Self {
            bucket,
            object_name: Some(object_name),
            subresource: None,
        }
    }

    /// Attach a subresource suffix such as `?lifecycle`.
    #[must_use]
    pub fn with_subresource(mut self, subresource: &'a str) -> Self {
        self.subresource = Some(subresource);
        self
    }

    /// Build the request path: `/`, `/{bucket}` or `/{bucket}/{escaped object}`.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = if self.bucket.is_empty() {
            "/".to_owned()
        } else {
            format!("/{}", self.bucket)
        };
        if let Some(name) = self.object_name.filter(|n| !n.is_empty()) {
            path.push('/');
            path.push_str(&escape_object_name(name));
        }
        path
    }
}

/// A request that is ready to be sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully composed URL.
    pub url: String,
    /// Headers including `Date`, `x-emc-namespace` and `Authorization`.
    pub headers: HeaderMap,
}

/// Signs requests for one endpoint and set of credentials.
#[derive(Debug, Clone)]
pub struct RequestAuthority {
    credentials: Credentials,
    endpoint: String,
}

impl RequestAuthority {
    /// Create an authority. Trailing slashes on the endpoint are stripped.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        let endpoint = credentials.endpoint.trim_end_matches('/').to_owned();
        Self {
            credentials,
            endpoint,
        }
    }

    /// The endpoint without trailing slashes.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The namespace used when a call does not override it.
    #[must_use]
    pub fn default_namespace(&self) -> &str {
        &self.credentials.namespace
    }

    /// The configured credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Compose the final URL for a resource: endpoint + path + subresource.
    #[must_use]
    pub fn url_for(&self, resource: &Resource<'_>) -> String {
        let mut url = format!("{}{}", self.endpoint, resource.path());
        if let Some(sub) = resource.subresource {
            url.push_str(sub);
        }
        url
    }

    /// Sign a request against `resource`.
    ///
    /// `namespace` overrides the configured namespace for this call only.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedAuthMethod`] when configured for V4,
    /// before anything else happens, and propagates signing errors.
    pub fn sign(
        &self,
        method: &Method,
        resource: &Resource<'_>,
        headers: &HeaderMap,
        namespace: Option<&str>,
    ) -> Result<SignedRequest, AuthError> {
        if self.credentials.auth_method != AuthMethod::V2 {
            return Err(AuthError::UnsupportedAuthMethod(
                self.credentials.auth_method,
            ));
        }

        let namespace = namespace.unwrap_or(&self.credentials.namespace);
        let mut headers = headers.clone();
        headers.insert(
            NAMESPACE_HEADER,
            to_header_value(NAMESPACE_HEADER.as_str(), namespace)?,
        );

        let url = self.url_for(resource);
        debug!(method = %method, url = %url, namespace = %namespace, "signing request");

        let headers = sign_v2(
            method,
            &url,
            &headers,
            &self.credentials.access_key,
            &self.credentials.secret_key,
        )?;

        Ok(SignedRequest {
            method: method.clone(),
            url,
            headers,
        })
    }
}

/// Escape an object name the way HTML form encoding does: spaces become `+`,
/// everything outside `[A-Za-z0-9-_.~]` is percent-encoded.
///
/// # Examples
///
/// ```
/// use ecs_s3_auth::authority::escape_object_name;
///
/// assert_eq!(escape_object_name("my file.txt"), "my+file.txt");
/// assert_eq!(escape_object_name("a/b"), "a%2Fb");
/// ```
#[must_use]
pub fn escape_object_name(name: &str) -> String {
    name.split(' ')
        .map(|part| utf8_percent_encode(part, OBJECT_NAME_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
