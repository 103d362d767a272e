//! Lifecycle integration tests.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ecs_s3_core::lifecycle::expiration_date_after_years;
    use ecs_s3_core::{ClientConfig, RemoveOutcome, WriteMode};
    use ecs_s3_model::{Expiration, LifecycleRule, UpsertOutcome};

    use crate::{cleanup_bucket, create_test_bucket, ecs_client, ecs_client_with};

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_apply_list_and_remove_rules() {
        let client = ecs_client();
        let bucket = create_test_bucket(&client, "lc").await;
        let lifecycle = client.lifecycle();

        let outcome = lifecycle
            .apply_rule(
                &bucket,
                LifecycleRule::new("expire30", Expiration::Days(30)).with_prefix("logs/"),
            )
            .await
            .expect("apply expire30");
        assert_eq!(outcome.outcome, UpsertOutcome::Appended);

        let date = expiration_date_after_years(Utc::now(), 1).expect("date");
        lifecycle
            .apply_rule(
                &bucket,
                LifecycleRule::new("expire-tmp", Expiration::Date(date)).with_prefix("tmp/"),
            )
            .await
            .expect("apply expire-tmp");

        let ids = lifecycle.list_rules(&bucket).await.expect("list");
        assert_eq!(ids, vec!["expire30", "expire-tmp"]);

        let id = "expire30".to_owned();
        let outcome = lifecycle.remove_rule(&bucket, &id).await.expect("remove");
        assert_eq!(outcome, RemoveOutcome::Removed { id: id.clone() });
        let outcome = lifecycle
            .remove_rule(&bucket, &id)
            .await
            .expect("remove again");
        assert_eq!(outcome, RemoveOutcome::NotFound { id });

        let document = lifecycle.get_lifecycle(&bucket).await.expect("get");
        assert_eq!(document.rule_ids(), vec!["expire-tmp"]);
        assert_eq!(document.rules()[0].expiration, Some(Expiration::Date(date)));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_replace_rule_with_same_id() {
        let client = ecs_client();
        let bucket = create_test_bucket(&client, "lcrep").await;
        let lifecycle = client.lifecycle();

        lifecycle
            .apply_rule(&bucket, LifecycleRule::new("r1", Expiration::Days(30)))
            .await
            .expect("apply");
        let outcome = lifecycle
            .apply_rule(&bucket, LifecycleRule::new("r1", Expiration::Days(60)))
            .await
            .expect("apply again");
        assert_eq!(outcome.outcome, UpsertOutcome::Replaced);

        let document = lifecycle.get_lifecycle(&bucket).await.expect("get");
        assert_eq!(document.len(), 1);
        assert_eq!(document.rules()[0].expiration, Some(Expiration::Days(60)));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_read_empty_document_after_delete() {
        let config = ClientConfig::builder()
            .write_mode(WriteMode::IfMatch)
            .build();
        let client = ecs_client_with(config);
        let bucket = create_test_bucket(&client, "lcdel").await;
        let lifecycle = client.lifecycle();

        lifecycle
            .apply_rule(&bucket, LifecycleRule::new("r1", Expiration::Days(1)))
            .await
            .expect("apply");
        lifecycle.delete_lifecycle(&bucket).await.expect("delete");

        let document = lifecycle.get_lifecycle(&bucket).await.expect("get");
        assert!(document.is_empty());

        cleanup_bucket(&client, &bucket).await;
    }
}
