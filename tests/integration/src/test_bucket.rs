//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use ecs_s3_core::UpdateOutcome;
    use ecs_s3_model::VersioningStatus;

    use crate::{cleanup_bucket, create_test_bucket, ecs_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_create_and_describe_bucket() {
        let client = ecs_client();
        let bucket = create_test_bucket(&client, "info").await;

        let info = client
            .buckets()
            .get_bucket_info(&bucket)
            .await
            .expect("bucket info")
            .expect("bucket exists");

        assert_eq!(info.name, bucket);
        assert_eq!(info.namespace, client.authority().default_namespace());
        assert_eq!(info.versioning_enabled, Some(false));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_report_missing_bucket() {
        let client = ecs_client();
        let info = client
            .buckets()
            .get_bucket_info(&test_bucket_name("missing"))
            .await
            .expect("bucket info");
        assert!(info.is_none());
    }

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_toggle_versioning() {
        let client = ecs_client();
        let buckets = client.buckets();
        let bucket = test_bucket_name("ver");
        buckets.create_bucket(&bucket, true).await.expect("create");

        let versioning = buckets.get_versioning(&bucket).await.expect("versioning");
        assert_eq!(versioning.status, Some(VersioningStatus::Enabled));

        let outcome = buckets
            .update_bucket(&bucket, Some(false))
            .await
            .expect("suspend");
        assert_eq!(
            outcome,
            UpdateOutcome::Versioning(VersioningStatus::Suspended)
        );
        let versioning = buckets.get_versioning(&bucket).await.expect("versioning");
        assert_eq!(versioning.status, Some(VersioningStatus::Suspended));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running endpoint"]
    async fn test_should_delete_bucket() {
        let client = ecs_client();
        let bucket = create_test_bucket(&client, "del").await;

        client
            .buckets()
            .delete_bucket(&bucket)
            .await
            .expect("delete");

        let info = client
            .buckets()
            .get_bucket_info(&bucket)
            .await
            .expect("bucket info");
        assert!(info.is_none());
    }
}
