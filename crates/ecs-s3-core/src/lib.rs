//! Bucket and lifecycle management for ECS S3-compatible endpoints.
//!
//! This crate ties the signer, the model and the XML layer together:
//!
//! - [`EcsClient`] signs requests with a [`RequestAuthority`](ecs_s3_auth::RequestAuthority)
//!   and sends them through an injected [`Transport`].
//! - [`BucketManager`] creates, inspects and deletes buckets.
//! - [`LifecycleManager`] edits the lifecycle document of a bucket through
//!   read-modify-write cycles. See [`lifecycle`] for the concurrency caveats.
//! - [`config`] loads connection profiles and client settings.
//!
//! # Usage
//!
//! ```no_run
//! use ecs_s3_auth::Credentials;
//! use ecs_s3_core::{ClientConfig, EcsClient};
//! use ecs_s3_model::{Expiration, LifecycleRule};
//!
//! # async fn run() -> Result<(), ecs_s3_core::ClientError> {
//! let credentials = Credentials::new("user1", "secret", "ns1", "https://ecs.example.com:9021");
//! let client = EcsClient::connect(credentials, ClientConfig::default())?;
//!
//! let rule = LifecycleRule::new("expire30", Expiration::Days(30)).with_prefix("logs/");
//! client.lifecycle().apply_rule("my-bucket", rule).await?;
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod checksums;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod transport;

pub use bucket::{BucketManager, UpdateOutcome};
pub use client::EcsClient;
pub use config::{ClientConfig, ConfigError, Profile, ProfileConfig, WriteMode};
pub use error::ClientError;
pub use lifecycle::{ApplyOutcome, LifecycleManager, RemoveOutcome};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
