use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusoto_core::Region;
use rusoto_logs::{CloudWatchLogsClient, CreateLogGroupRequest, PutRetentionPolicyRequest};

use crate::client::LogsApi;
use crate::error::{AlreadyExists, CloudWatchLogError};
use crate::handle::{Clock, CloudWatchLog};
use crate::template::StreamTemplate;
use crate::{DEFAULT_LOG_STREAM_TEMPLATE, DEFAULT_RETENTION_IN_DAYS};

/// Collects the settings of a [`CloudWatchLog`].
///
/// A client must be chosen with [`with_client`](Self::with_client),
/// [`default_client`](Self::default_client) or [`region`](Self::region)
/// before the handle can be built.
pub struct CloudWatchLogBuilder<C> {
    client: C,
    log_group: String,
    log_stream: Option<String>,
    log_stream_template: String,
    retention_in_days: i64,
    kms_key_id: Option<String>,
    tags: Option<HashMap<String, String>>,
    clock: Clock,
}

impl CloudWatchLogBuilder<()> {
    pub fn new(log_group: &str) -> Self {
        Self {
            client: (),
            log_group: log_group.to_string(),
            log_stream: None,
            log_stream_template: DEFAULT_LOG_STREAM_TEMPLATE.to_string(),
            retention_in_days: DEFAULT_RETENTION_IN_DAYS,
            kms_key_id: None,
            tags: None,
            clock: Box::new(Utc::now),
        }
    }
}

impl<C> CloudWatchLogBuilder<C> {
    pub fn with_client<C2>(self, client: C2) -> CloudWatchLogBuilder<C2>
    where
        C2: LogsApi + 'static,
    {
        CloudWatchLogBuilder {
            client,
            log_group: self.log_group,
            log_stream: self.log_stream,
            log_stream_template: self.log_stream_template,
            retention_in_days: self.retention_in_days,
            kms_key_id: self.kms_key_id,
            tags: self.tags,
            clock: self.clock,
        }
    }

    /// Uses a client for the region found in the environment.
    pub fn default_client(self) -> CloudWatchLogBuilder<CloudWatchLogsClient> {
        self.region(Region::default())
    }

    pub fn region(self, region: Region) -> CloudWatchLogBuilder<CloudWatchLogsClient> {
        self.with_client(CloudWatchLogsClient::new(region))
    }

    /// Base name of the log streams. Empty means the log group name.
    pub fn log_stream(mut self, log_stream: &str) -> Self {
        self.log_stream = Some(log_stream.to_string());
        self
    }

    /// Empty means [`DEFAULT_LOG_STREAM_TEMPLATE`].
    pub fn log_stream_template(mut self, template: &str) -> Self {
        self.log_stream_template = template.to_string();
        self
    }

    /// Zero means [`DEFAULT_RETENTION_IN_DAYS`].
    pub fn retention_in_days(mut self, days: i64) -> Self {
        self.retention_in_days = days;
        self
    }

    /// KMS key used to encrypt the log group when it gets created.
    pub fn kms_key_id(mut self, kms_key_id: &str) -> Self {
        self.kms_key_id = Some(kms_key_id.to_string());
        self
    }

    /// Tags applied to the log group when it gets created.
    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }
}

impl<C> CloudWatchLogBuilder<C>
where
    C: LogsApi + 'static,
{
    /// Creates the log group if missing, applies the retention policy and
    /// returns the handle.
    pub async fn build(self) -> Result<CloudWatchLog<C>, CloudWatchLogError> {
        let CloudWatchLogBuilder {
            client,
            log_group,
            log_stream,
            log_stream_template,
            retention_in_days,
            kms_key_id,
            tags,
            clock,
        } = self;

        if log_group.is_empty() {
            return Err(CloudWatchLogError::MissingLogGroup);
        }
        let template = if log_stream_template.is_empty() {
            StreamTemplate::parse(DEFAULT_LOG_STREAM_TEMPLATE)?
        } else {
            StreamTemplate::parse(&log_stream_template)?
        };
        let log_stream = log_stream
            .filter(|stream| !stream.is_empty())
            .unwrap_or_else(|| log_group.clone());
        let retention_in_days = if retention_in_days == 0 {
            DEFAULT_RETENTION_IN_DAYS
        } else {
            retention_in_days
        };

        let group_input = CreateLogGroupRequest {
            log_group_name: log_group.clone(),
            kms_key_id,
            tags,
        };
        match client.create_log_group(group_input).await {
            Ok(()) => tracing::debug!(log_group = %log_group, "created log group"),
            Err(error) if error.already_exists() => {
                tracing::debug!(log_group = %log_group, "log group already exists")
            }
            Err(error) => {
                tracing::warn!(log_group = %log_group, %error, "failed to create log group");
                return Err(CloudWatchLogError::CreateLogGroup { log_group, error });
            }
        }

        let retention_input = PutRetentionPolicyRequest {
            log_group_name: log_group.clone(),
            retention_in_days,
        };
        if let Err(error) = client.put_retention_policy(retention_input).await {
            tracing::warn!(
                log_group = %log_group,
                retention_in_days,
                %error,
                "failed to put retention policy"
            );
            return Err(CloudWatchLogError::PutRetentionPolicy {
                log_group,
                retention_in_days,
                error,
            });
        }

        Ok(CloudWatchLog::new(client, log_group, log_stream, template, clock))
    }
}
