//! Integration tests against a live ECS S3 endpoint.
//!
//! These tests need an endpoint and an object user, taken from the same
//! `ECS_S3_*` variables the command-line client reads:
//!
//! ```text
//! ECS_S3_ENDPOINT=http://ecs.local:9020 ECS_S3_ACCESS_KEY=user1 \
//! ECS_S3_SECRET_KEY=... ECS_S3_NAMESPACE=ns1 \
//! cargo test -p ecs-s3-integration -- --ignored
//! ```
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.

use std::sync::Once;

use ecs_s3_core::{ClientConfig, EcsClient, Profile};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Create a client from `ECS_S3_*` environment variables.
#[must_use]
pub fn ecs_client() -> EcsClient {
    ecs_client_with(ClientConfig::from_env())
}

/// Create a client from `ECS_S3_*` environment variables with explicit settings.
#[must_use]
pub fn ecs_client_with(config: ClientConfig) -> EcsClient {
    init_tracing();

    let credentials = Profile::default()
        .with_env_overrides()
        .into_credentials()
        .expect("ECS_S3_ENDPOINT, ECS_S3_ACCESS_KEY, ECS_S3_SECRET_KEY and ECS_S3_NAMESPACE must be set");
    EcsClient::connect(credentials, config).expect("failed to build client")
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a bucket and return its name. Caller is responsible for cleanup.
pub async fn create_test_bucket(client: &EcsClient, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    client
        .buckets()
        .create_bucket(&name, false)
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

/// Drop the lifecycle document, then delete the bucket.
pub async fn cleanup_bucket(client: &EcsClient, bucket: &str) {
    let _ = client.lifecycle().delete_lifecycle(bucket).await;
    let _ = client.buckets().delete_bucket(bucket).await;
}

mod test_bucket;
mod test_lifecycle;
