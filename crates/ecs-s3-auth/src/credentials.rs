//! Credentials and authentication method selection.
//!
//! [`Credentials`] carries everything needed to sign requests against one ECS
//! endpoint. The secret key is never printed: the `Debug` implementation redacts it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Request authentication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HMAC-SHA1 header signing (`Authorization: AWS key:signature`).
    #[default]
    V2,
    /// AWS Signature Version 4. Accepted in configuration, rejected at signing time.
    V4,
}

impl AuthMethod {
    /// Returns the configuration spelling of this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V4 => "v4",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v2" => Ok(Self::V2),
            "v4" => Ok(Self::V4),
            _ => Err(AuthError::UnknownAuthMethod(s.to_owned())),
        }
    }
}

/// Access credentials and target endpoint for one ECS namespace.
///
/// # Examples
///
/// ```
/// use ecs_s3_auth::credentials::{AuthMethod, Credentials};
///
/// let creds = Credentials::new("user1", "secret", "ns1", "https://ecs.example.com:9021");
/// assert_eq!(creds.auth_method, AuthMethod::V2);
/// assert!(!format!("{creds:?}").contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// S3 access key (the ECS object user name).
    pub access_key: String,
    /// S3 secret key.
    pub secret_key: String,
    /// ECS namespace sent in `x-emc-namespace`.
    pub namespace: String,
    /// Endpoint base URL, e.g. `https://ecs.example.com:9021`.
    pub endpoint: String,
    /// Region, only meaningful for the V4 scheme.
    #[serde(default)]
    pub region: Option<String>,
    /// Authentication scheme.
    #[serde(default)]
    pub auth_method: AuthMethod,
}

impl Credentials {
    /// Create V2 credentials with no region.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        namespace: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            namespace: namespace.into(),
            endpoint: endpoint.into(),
            region: None,
            auth_method: AuthMethod::V2,
        }
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the authentication method.
    #[must_use]
    pub fn with_auth_method(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_auth_method_case_insensitively() {
        assert_eq!("v2".parse::<AuthMethod>().unwrap(), AuthMethod::V2);
        assert_eq!("V4".parse::<AuthMethod>().unwrap(), AuthMethod::V4);
        assert!(matches!(
            "sigv3".parse::<AuthMethod>(),
            Err(AuthError::UnknownAuthMethod(_))
        ));
    }

    #[test]
    fn test_should_redact_secret_key_in_debug_output() {
        let creds = Credentials::new("AKID", "very-secret", "ns", "http://localhost:9020");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_should_apply_builder_style_setters() {
        let creds = Credentials::new("a", "s", "ns", "http://e")
            .with_region("eu-west-1")
            .with_auth_method(AuthMethod::V4);
        assert_eq!(creds.region.as_deref(), Some("eu-west-1"));
        assert_eq!(creds.auth_method, AuthMethod::V4);
    }
}
