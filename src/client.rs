use std::sync::Arc;

use async_trait::async_trait;
use rusoto_core::RusotoError;
use rusoto_logs::{
    CloudWatchLogs, CloudWatchLogsClient, CreateLogGroupError, CreateLogGroupRequest,
    CreateLogStreamError, CreateLogStreamRequest, PutLogEventsError, PutLogEventsRequest,
    PutLogEventsResponse, PutRetentionPolicyError, PutRetentionPolicyRequest,
};

/// The subset of the CloudWatch Logs API used by [`CloudWatchLog`](crate::CloudWatchLog).
///
/// Implemented for [`CloudWatchLogsClient`]; plug in another implementation
/// with [`CloudWatchLogBuilder::with_client`](crate::CloudWatchLogBuilder::with_client).
#[async_trait]
pub trait LogsApi: Send + Sync {
    async fn create_log_group(
        &self,
        input: CreateLogGroupRequest,
    ) -> Result<(), RusotoError<CreateLogGroupError>>;

    async fn put_retention_policy(
        &self,
        input: PutRetentionPolicyRequest,
    ) -> Result<(), RusotoError<PutRetentionPolicyError>>;

    async fn create_log_stream(
        &self,
        input: CreateLogStreamRequest,
    ) -> Result<(), RusotoError<CreateLogStreamError>>;

    async fn put_log_events(
        &self,
        input: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, RusotoError<PutLogEventsError>>;
}

#[async_trait]
impl LogsApi for CloudWatchLogsClient {
    async fn create_log_group(
        &self,
        input: CreateLogGroupRequest,
    ) -> Result<(), RusotoError<CreateLogGroupError>> {
        CloudWatchLogs::create_log_group(self, input).await
    }

    async fn put_retention_policy(
        &self,
        input: PutRetentionPolicyRequest,
    ) -> Result<(), RusotoError<PutRetentionPolicyError>> {
        CloudWatchLogs::put_retention_policy(self, input).await
    }

    async fn create_log_stream(
        &self,
        input: CreateLogStreamRequest,
    ) -> Result<(), RusotoError<CreateLogStreamError>> {
        CloudWatchLogs::create_log_stream(self, input).await
    }

    async fn put_log_events(
        &self,
        input: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, RusotoError<PutLogEventsError>> {
        CloudWatchLogs::put_log_events(self, input).await
    }
}

#[async_trait]
impl<T> LogsApi for Arc<T>
where
    T: LogsApi + ?Sized,
{
    async fn create_log_group(
        &self,
        input: CreateLogGroupRequest,
    ) -> Result<(), RusotoError<CreateLogGroupError>> {
        (**self).create_log_group(input).await
    }

    async fn put_retention_policy(
        &self,
        input: PutRetentionPolicyRequest,
    ) -> Result<(), RusotoError<PutRetentionPolicyError>> {
        (**self).put_retention_policy(input).await
    }

    async fn create_log_stream(
        &self,
        input: CreateLogStreamRequest,
    ) -> Result<(), RusotoError<CreateLogStreamError>> {
        (**self).create_log_stream(input).await
    }

    async fn put_log_events(
        &self,
        input: PutLogEventsRequest,
    ) -> Result<PutLogEventsResponse, RusotoError<PutLogEventsError>> {
        (**self).put_log_events(input).await
    }
}
