//! Command-line definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use ecs_s3_core::config::DEFAULT_CONFIG_PATH;
use ecs_s3_core::{ClientConfig, Profile, WriteMode};
use ecs_s3_model::{RuleStatus, UpsertPolicy};

/// Output format of command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// One `key: value` or item per line.
    Text,
    /// Block-style YAML.
    Yaml,
    /// Aligned columns for lists of records; other results render as text.
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "ecs-s3", version, long_about = None)]
#[command(about = "Manage buckets and lifecycle rules on ECS S3 endpoints")]
pub struct Cli {
    /// Profile file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Profile name; `default` when omitted.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub access_key: Option<String>,

    #[arg(long, global = true)]
    pub secret_key: Option<String>,

    #[arg(long, global = true)]
    pub namespace: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    /// `v2` (supported) or `v4` (rejected before any request).
    #[arg(long, global = true)]
    pub auth_method: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log filter, e.g. `info` or `ecs_s3_core=debug`. `RUST_LOG` wins when set.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write lifecycle documents conditionally on the ETag that was read.
    #[arg(long, global = true)]
    pub if_match: bool,

    /// `append` or `replace` (default) when a rule id already exists.
    #[arg(long, global = true)]
    pub upsert_policy: Option<UpsertPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bucket management.
    #[command(subcommand)]
    Bucket(BucketCommand),
    /// Lifecycle rule management.
    #[command(subcommand)]
    Lifecycle(LifecycleCommand),
}

#[derive(Debug, Subcommand)]
pub enum BucketCommand {
    /// Create a bucket.
    Create {
        bucket: String,
        /// Enable versioning right after creation.
        #[arg(long)]
        versioning: bool,
    },
    /// Change bucket settings.
    Update {
        bucket: String,
        /// `true` to enable versioning, `false` to suspend it.
        #[arg(long)]
        versioning: Option<bool>,
    },
    /// Show bucket metadata.
    Info { bucket: String },
    /// Delete an empty bucket.
    Delete { bucket: String },
}

#[derive(Debug, Subcommand)]
pub enum LifecycleCommand {
    /// Show the lifecycle document.
    Get { bucket: String },
    /// List rule ids.
    ListRules { bucket: String },
    /// Create or replace a rule.
    Apply {
        bucket: String,
        /// Rule id.
        id: String,
        /// Expire objects this many days after creation.
        #[arg(long)]
        days: Option<u32>,
        /// Expire objects at midnight UTC on this date (YYYY-MM-DD).
        #[arg(long, conflicts_with = "years")]
        date: Option<NaiveDate>,
        /// Expire objects at midnight UTC this many years from today.
        #[arg(long)]
        years: Option<u32>,
        /// Remove delete markers whose versions have all expired.
        #[arg(long)]
        expired_object_delete_marker: bool,
        /// Only apply to keys starting with this prefix.
        #[arg(long, alias = "filter")]
        prefix: Option<String>,
        #[arg(long, default_value = "Enabled")]
        status: RuleStatus,
        /// Recorded on the rule, not sent to the server.
        #[arg(long)]
        tag: Option<String>,
    },
    /// Remove a rule; a missing rule is reported, not an error.
    Remove { bucket: String, id: String },
    /// Delete the whole lifecycle document.
    Delete { bucket: String },
    /// Replace the lifecycle document with the contents of a file.
    Put { bucket: String, file: PathBuf },
    /// Expire every prefix of the profile's `prefix_list` after a number of years.
    Batch {
        bucket: String,
        #[arg(long, default_value_t = 1)]
        years: u32,
        /// Prefixes to use instead of the profile's `prefix_list`.
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
}

impl Cli {
    /// Connection settings given on the command line.
    pub fn profile_overrides(&self) -> Profile {
        Profile {
            endpoint: self.endpoint.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            namespace: self.namespace.clone(),
            region: self.region.clone(),
            auth_method: self.auth_method.clone(),
            prefix_list: Vec::new(),
        }
    }

    /// Client settings from the environment, overridden by flags.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(level) = &self.log_level {
            config.log_level.clone_from(level);
        }
        if let Some(policy) = self.upsert_policy {
            config.upsert_policy = policy;
        }
        if self.if_match {
            config.write_mode = WriteMode::IfMatch;
        }
        config
    }
}
