//! Command dispatch.

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::info;

use ecs_s3_core::EcsClient;
use ecs_s3_core::lifecycle::{date_rules_for_prefixes, expiration_date_after_years};
use ecs_s3_model::{Expiration, LifecycleRule};

use crate::cli::{BucketCommand, Command, LifecycleCommand};

/// Run `command` and return its result for rendering.
///
/// `prefix_list` comes from the selected profile and feeds `lifecycle batch`.
pub async fn run(client: &EcsClient, command: Command, prefix_list: &[String]) -> Result<Value> {
    match command {
        Command::Bucket(command) => run_bucket(client, command).await,
        Command::Lifecycle(command) => run_lifecycle(client, command, prefix_list).await,
    }
}

async fn run_bucket(client: &EcsClient, command: BucketCommand) -> Result<Value> {
    let buckets = client.buckets();
    match command {
        BucketCommand::Create { bucket, versioning } => {
            buckets.create_bucket(&bucket, versioning).await?;
            Ok(json!({ "bucket": bucket, "created": true, "versioning_enabled": versioning }))
        }
        BucketCommand::Update { bucket, versioning } => {
            let outcome = buckets.update_bucket(&bucket, versioning).await?;
            Ok(json!({ "bucket": bucket, "update": outcome }))
        }
        BucketCommand::Info { bucket } => match buckets.get_bucket_info(&bucket).await? {
            Some(metadata) => Ok(serde_json::to_value(metadata)?),
            None => Ok(json!({ "bucket": bucket, "exists": false })),
        },
        BucketCommand::Delete { bucket } => {
            buckets.delete_bucket(&bucket).await?;
            Ok(json!({ "bucket": bucket, "deleted": true }))
        }
    }
}

async fn run_lifecycle(
    client: &EcsClient,
    command: LifecycleCommand,
    prefix_list: &[String],
) -> Result<Value> {
    let lifecycle = client.lifecycle();
    match command {
        LifecycleCommand::Get { bucket } => {
            let document = lifecycle.get_lifecycle(&bucket).await?;
            Ok(serde_json::to_value(document)?)
        }
        LifecycleCommand::ListRules { bucket } => {
            let ids = lifecycle.list_rules(&bucket).await?;
            Ok(json!(ids))
        }
        LifecycleCommand::Apply {
            bucket,
            id,
            days,
            date,
            years,
            expired_object_delete_marker,
            prefix,
            status,
            tag,
        } => {
            let date = match (date, years) {
                (Some(date), _) => Some(midnight_utc(date)),
                (None, Some(years)) => Some(
                    expiration_date_after_years(Utc::now(), years)
                        .with_context(|| format!("{years} years from now is out of range"))?,
                ),
                (None, None) => None,
            };
            let Some(expiration) = Expiration::from_parts(days, date, expired_object_delete_marker)
            else {
                bail!(
                    "rule {id} needs an expiration: pass --days, --date, --years or --expired-object-delete-marker"
                );
            };

            let mut rule = LifecycleRule::new(id, expiration).with_status(status);
            if let Some(prefix) = prefix {
                rule = rule.with_prefix(prefix);
            }
            if let Some(tag) = tag {
                rule = rule.with_tag(tag);
            }

            let outcome = lifecycle.apply_rule(&bucket, rule).await?;
            Ok(serde_json::to_value(outcome)?)
        }
        LifecycleCommand::Remove { bucket, id } => {
            let outcome = lifecycle.remove_rule(&bucket, &id).await?;
            Ok(serde_json::to_value(outcome)?)
        }
        LifecycleCommand::Delete { bucket } => {
            lifecycle.delete_lifecycle(&bucket).await?;
            Ok(json!({ "bucket": bucket, "deleted": true }))
        }
        LifecycleCommand::Put { bucket, file } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            lifecycle
                .put_lifecycle_xml(&bucket, Bytes::from(body))
                .await?;
            Ok(json!({ "bucket": bucket, "replaced": true }))
        }
        LifecycleCommand::Batch {
            bucket,
            years,
            prefixes,
        } => {
            let prefixes = if prefixes.is_empty() {
                prefix_list
            } else {
                prefixes.as_slice()
            };
            if prefixes.is_empty() {
                bail!("no prefixes: pass --prefix or set prefix_list in the profile");
            }

            let date = expiration_date_after_years(Utc::now(), years)
                .with_context(|| format!("{years} years from now is out of range"))?;
            info!(%bucket, prefixes = prefixes.len(), %date, "applying prefix expiration rules");

            let rules = date_rules_for_prefixes(prefixes, date);
            let outcomes = lifecycle.apply_rules(&bucket, rules).await?;
            Ok(serde_json::to_value(outcomes)?)
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
