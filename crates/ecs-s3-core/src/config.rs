//! Client configuration.
//!
//! Two layers are provided:
//!
//! - [`ProfileConfig`]: a TOML file of named connection profiles, each holding
//!   an endpoint, credentials and namespace. `ECS_S3_*` environment variables
//!   override the selected profile.
//! - [`ClientConfig`]: behavioral settings (upsert policy, write mode,
//!   timeouts, log level), loaded from environment variables.
//!
//! A profile file looks like this:
//!
//! ```toml
//! [default]
//! endpoint = "https://ecs.example.com:9021"
//! access_key = "user1"
//! secret_key = "..."
//! namespace = "ns1"
//!
//! [archive]
//! endpoint = "https://ecs-dr.example.com:9021"
//! access_key = "user2"
//! secret_key = "..."
//! namespace = "archive"
//! auth_method = "v2"
//! prefix_list = ["logs/", "tmp/"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use typed_builder::TypedBuilder;

use ecs_s3_auth::{AuthError, AuthMethod, Credentials};
use ecs_s3_model::{ParseEnumError, UpsertPolicy};

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "default";

/// Profile file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = ".config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The profile file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The profile file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The requested profile is not in the file.
    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    /// A setting required to build credentials is missing.
    #[error("missing required setting '{0}'")]
    MissingField(&'static str),

    /// The authentication method is neither `v2` nor `v4`.
    #[error(transparent)]
    AuthMethod(#[from] AuthError),

    /// A behavioral setting has a value the client cannot work with.
    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// One named connection profile.
///
/// Every field is optional so that a profile can be completed by environment
/// variables or command-line flags; [`Profile::into_credentials`] checks that
/// the required ones are present.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Endpoint URL, e.g. `https://ecs.example.com:9021`.
    pub endpoint: Option<String>,
    /// Object user name.
    pub access_key: Option<String>,
    /// Object user secret.
    pub secret_key: Option<String>,
    /// ECS namespace.
    pub namespace: Option<String>,
    /// Region; informational for V2 signing.
    pub region: Option<String>,
    /// `v2` or `v4`.
    pub auth_method: Option<String>,
    /// Prefixes maintained by `lifecycle batch`.
    #[serde(default)]
    pub prefix_list: Vec<String>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("namespace", &self.namespace)
            .field("region", &self.region)
            .field("auth_method", &self.auth_method)
            .field("prefix_list", &self.prefix_list)
            .finish()
    }
}

impl Profile {
    /// Apply `ECS_S3_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up by variable name.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ECS_S3_ENDPOINT` | `endpoint` |
    /// | `ECS_S3_ACCESS_KEY` | `access_key` |
    /// | `ECS_S3_SECRET_KEY` | `secret_key` |
    /// | `ECS_S3_NAMESPACE` | `namespace` |
    /// | `ECS_S3_REGION` | `region` |
    /// | `ECS_S3_AUTH_METHOD` | `auth_method` |
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fields = [
            ("ECS_S3_ENDPOINT", &mut self.endpoint),
            ("ECS_S3_ACCESS_KEY", &mut self.access_key),
            ("ECS_S3_SECRET_KEY", &mut self.secret_key),
            ("ECS_S3_NAMESPACE", &mut self.namespace),
            ("ECS_S3_REGION", &mut self.region),
            ("ECS_S3_AUTH_METHOD", &mut self.auth_method),
        ];
        for (name, field) in fields {
            if let Some(v) = lookup(name) {
                *field = Some(v);
            }
        }
        self
    }

    /// Overlay the fields set in `other` on top of this profile.
    #[must_use]
    pub fn merge(mut self, other: Profile) -> Self {
        self.endpoint = other.endpoint.or(self.endpoint);
        self.access_key = other.access_key.or(self.access_key);
        self.secret_key = other.secret_key.or(self.secret_key);
        self.namespace = other.namespace.or(self.namespace);
        self.region = other.region.or(self.region);
        self.auth_method = other.auth_method.or(self.auth_method);
        if !other.prefix_list.is_empty() {
            self.prefix_list = other.prefix_list;
        }
        self
    }

    /// Build credentials from this profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when endpoint, keys or namespace
    /// are missing, and [`ConfigError::AuthMethod`] for an unknown method.
    pub fn into_credentials(self) -> Result<Credentials, ConfigError> {
        let endpoint = self.endpoint.ok_or(ConfigError::MissingField("endpoint"))?;
        let access_key = self
            .access_key
            .ok_or(ConfigError::MissingField("access_key"))?;
        let secret_key = self
            .secret_key
            .ok_or(ConfigError::MissingField("secret_key"))?;
        let namespace = self.namespace.ok_or(ConfigError::MissingField("namespace"))?;

        let mut credentials = Credentials::new(access_key, secret_key, namespace, endpoint);
        if let Some(region) = self.region {
            credentials = credentials.with_region(region);
        }
        if let Some(method) = self.auth_method {
            credentials = credentials.with_auth_method(method.parse::<AuthMethod>()?);
        }
        Ok(credentials)
    }
}

/// All profiles of a profile file, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileConfig {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileConfig {
    /// Load a profile file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a profile file, treating a missing file as having no profiles.
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable or unparsable files that do exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Look up a profile by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Pick the profile to use.
    ///
    /// A named profile must exist. Without a name the `default` profile is
    /// used when present, and an empty profile otherwise, leaving environment
    /// variables and flags to supply the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] for a name not in the file.
    pub fn resolve(&self, name: Option<&str>) -> Result<Profile, ConfigError> {
        match name {
            Some(name) => self
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned())),
            None => Ok(self.get(DEFAULT_PROFILE).cloned().unwrap_or_default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Client behavior
// ---------------------------------------------------------------------------

/// How the lifecycle document is written back after a read-modify-write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Unconditional `PUT`; a concurrent writer's change can be lost.
    #[default]
    LastWriteWins,
    /// `PUT` with `If-Match` on the ETag that was read (`If-None-Match: *`
    /// when there was no document). Requires server support.
    IfMatch,
}

impl WriteMode {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastWriteWins => "last-write-wins",
            Self::IfMatch => "if-match",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "last-write-wins" => Ok(Self::LastWriteWins),
            "if-match" => Ok(Self::IfMatch),
            _ => Err(ParseEnumError::new("write mode", s)),
        }
    }
}

/// Behavioral settings of the client.
///
/// # Examples
///
/// ```
/// use ecs_s3_core::config::{ClientConfig, WriteMode};
/// use ecs_s3_model::UpsertPolicy;
///
/// let config = ClientConfig::builder().write_mode(WriteMode::IfMatch).build();
/// assert_eq!(config.upsert_policy, UpsertPolicy::Replace);
/// assert_eq!(config.request_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ClientConfig {
    /// What applying a rule does when its id already exists.
    #[builder(default)]
    pub upsert_policy: UpsertPolicy,

    /// Whether lifecycle writes are conditional.
    #[builder(default)]
    pub write_mode: WriteMode,

    /// Per-request timeout of the HTTP transport, in seconds.
    #[builder(default = 30)]
    pub request_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `ECS_S3_UPSERT_POLICY` | `replace` |
    /// | `ECS_S3_WRITE_MODE` | `last-write-wins` |
    /// | `ECS_S3_REQUEST_TIMEOUT` | `30` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparsable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from variables looked up by name.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("ECS_S3_UPSERT_POLICY") {
            match v.parse() {
                Ok(policy) => config.upsert_policy = policy,
                Err(err) => warn!(%err, "ignoring ECS_S3_UPSERT_POLICY"),
            }
        }
        if let Some(v) = lookup("ECS_S3_WRITE_MODE") {
            match v.parse() {
                Ok(mode) => config.write_mode = mode,
                Err(err) => warn!(%err, "ignoring ECS_S3_WRITE_MODE"),
            }
        }
        if let Some(v) = lookup("ECS_S3_REQUEST_TIMEOUT") {
            match v.parse::<u64>() {
                Ok(0) => warn!(value = %v, "ignoring zero ECS_S3_REQUEST_TIMEOUT"),
                Ok(secs) => config.request_timeout_secs = secs,
                Err(err) => warn!(%err, value = %v, "ignoring ECS_S3_REQUEST_TIMEOUT"),
            }
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The transport timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check settings that would make every request fail.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for a zero request timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "request_timeout_secs",
                reason: "must be at least one second".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    const PROFILES: &str = r#"
[default]
endpoint = "https://ecs.example.com:9021"
access_key = "user1"
secret_key = "s3cr3t"
namespace = "ns1"

[archive]
endpoint = "http://10.0.0.5:9020"
access_key = "user2"
secret_key = "other"
namespace = "archive"
region = "eu-west-1"
auth_method = "V2"
prefix_list = ["logs/", "tmp/"]
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_should_load_profiles_from_toml() {
        let file = write_config(PROFILES);
        let config = ProfileConfig::load(file.path()).unwrap();

        assert_eq!(
            config.names().collect::<Vec<_>>(),
            vec!["archive", "default"]
        );
        let archive = config.resolve(Some("archive")).unwrap();
        assert_eq!(archive.prefix_list, vec!["logs/", "tmp/"]);

        let credentials = archive.into_credentials().unwrap();
        assert_eq!(credentials.endpoint, "http://10.0.0.5:9020");
        assert_eq!(credentials.region.as_deref(), Some("eu-west-1"));
        assert_eq!(credentials.auth_method, AuthMethod::V2);
    }

    #[test]
    fn test_should_resolve_default_profile_or_empty() {
        let config = ProfileConfig::load(write_config(PROFILES).path()).unwrap();
        assert_eq!(
            config.resolve(None).unwrap().namespace.as_deref(),
            Some("ns1")
        );
        assert_eq!(
            ProfileConfig::default().resolve(None).unwrap(),
            Profile::default()
        );
        assert!(matches!(
            config.resolve(Some("missing")),
            Err(ConfigError::UnknownProfile(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_should_treat_missing_file_as_empty_only_when_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(ProfileConfig::load(&path), Err(ConfigError::Read { .. })));
        assert_eq!(
            ProfileConfig::load_or_default(&path).unwrap(),
            ProfileConfig::default()
        );
    }

    #[test]
    fn test_should_reject_invalid_toml() {
        let file = write_config("[default]\nendpoint = ");
        assert!(matches!(
            ProfileConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let unknown_field = write_config("[default]\nendpoint = \"x\"\nbucket = \"b\"\n");
        assert!(ProfileConfig::load(unknown_field.path()).is_err());
    }

    #[test]
    fn test_should_apply_env_overrides_then_flags() {
        let config = ProfileConfig::load(write_config(PROFILES).path()).unwrap();
        let profile = config
            .resolve(None)
            .unwrap()
            .with_overrides_from(lookup(&[
                ("ECS_S3_NAMESPACE", "from-env"),
                ("ECS_S3_ENDPOINT", "http://env:9020"),
            ]))
            .merge(Profile {
                endpoint: Some("http://flag:9020".to_owned()),
                ..Profile::default()
            });

        assert_eq!(profile.namespace.as_deref(), Some("from-env"));
        assert_eq!(profile.endpoint.as_deref(), Some("http://flag:9020"));
        assert_eq!(profile.access_key.as_deref(), Some("user1"));
    }

    #[test]
    fn test_should_require_credentials_fields() {
        let profile = Profile {
            endpoint: Some("http://h".to_owned()),
            access_key: Some("a".to_owned()),
            ..Profile::default()
        };
        assert!(matches!(
            profile.into_credentials(),
            Err(ConfigError::MissingField("secret_key"))
        ));
    }

    #[test]
    fn test_should_reject_unknown_auth_method() {
        let profile = Profile {
            auth_method: Some("v3".to_owned()),
            ..Profile::default()
        }
        .merge(Profile {
            endpoint: Some("http://h".to_owned()),
            access_key: Some("a".to_owned()),
            secret_key: Some("s".to_owned()),
            namespace: Some("n".to_owned()),
            ..Profile::default()
        });
        assert!(matches!(
            profile.into_credentials(),
            Err(ConfigError::AuthMethod(AuthError::UnknownAuthMethod(_)))
        ));
    }

    #[test]
    fn test_should_redact_secret_in_debug() {
        let profile = Profile {
            secret_key: Some("hunter2".to_owned()),
            ..Profile::default()
        };
        let debug = format!("{profile:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_should_load_client_config_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ECS_S3_UPSERT_POLICY", "append"),
            ("ECS_S3_WRITE_MODE", "if_match"),
            ("ECS_S3_REQUEST_TIMEOUT", "5"),
            ("LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.upsert_policy, UpsertPolicy::Append);
        assert_eq!(config.write_mode, WriteMode::IfMatch);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_should_ignore_invalid_client_config_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ECS_S3_UPSERT_POLICY", "merge"),
            ("ECS_S3_REQUEST_TIMEOUT", "soon"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_should_reject_zero_request_timeout() {
        let config = ClientConfig::from_lookup(lookup(&[("ECS_S3_REQUEST_TIMEOUT", "0")]));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());

        let config = ClientConfig::builder().request_timeout_secs(0).build();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "request_timeout_secs",
                ..
            }
        ));
    }
}
