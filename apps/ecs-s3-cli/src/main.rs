//! ecs-s3 - bucket and lifecycle management for ECS S3 endpoints.
//!
//! # Usage
//!
//! ```text
//! ecs-s3 --profile archive lifecycle apply logs expire30 --days 30 --prefix logs/
//! ecs-s3 lifecycle batch logs --years 7
//! ecs-s3 --format json bucket info logs
//! ```
//!
//! Connection settings come from the profile file (`.config.toml` by default),
//! then `ECS_S3_*` environment variables, then command-line flags.
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `ECS_S3_ENDPOINT` | Endpoint URL |
//! | `ECS_S3_ACCESS_KEY` | Object user |
//! | `ECS_S3_SECRET_KEY` | Object user secret |
//! | `ECS_S3_NAMESPACE` | Namespace |
//! | `ECS_S3_REGION` | Region |
//! | `ECS_S3_AUTH_METHOD` | `v2` or `v4` |
//! | `ECS_S3_UPSERT_POLICY` | `replace` or `append` |
//! | `ECS_S3_WRITE_MODE` | `last-write-wins` or `if-match` |
//! | `ECS_S3_REQUEST_TIMEOUT` | Request timeout in seconds |
//! | `LOG_LEVEL` | Log level filter |
//! | `RUST_LOG` | *(unset)* Fine-grained tracing filter (overrides the log level) |

mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ecs_s3_core::{EcsClient, ProfileConfig};

use crate::cli::Cli;

/// Initialize the tracing subscriber on stderr so stdout only carries results.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the configured log level.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.client_config();
    init_tracing(&config.log_level)?;

    let profile = ProfileConfig::load_or_default(&cli.config)?
        .resolve(cli.profile.as_deref())?
        .with_env_overrides()
        .merge(cli.profile_overrides());
    debug!(?profile, "resolved profile");

    let prefix_list = profile.prefix_list.clone();
    let credentials = profile
        .into_credentials()
        .context("incomplete connection settings")?;
    let client = EcsClient::connect(credentials, config)?;

    let value = commands::run(&client, cli.command, &prefix_list).await?;
    println!("{}", output::render(cli.format, &value)?);
    Ok(())
}
