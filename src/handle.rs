use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusoto_logs::{CreateLogStreamRequest, InputLogEvent, PutLogEventsRequest};

use crate::client::LogsApi;
use crate::error::{AlreadyExists, CloudWatchLogError};
use crate::template::StreamTemplate;

pub(crate) type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Handle sending log events to one CloudWatch Logs group.
///
/// The target stream name is derived from the template on every write. The
/// last stream known to exist is remembered, and a new stream is created
/// when the derived name moves past it (e.g. on the next hour).
pub struct CloudWatchLog<C> {
    client: C,
    log_group: String,
    log_stream: String,
    template: StreamTemplate,
    clock: Clock,
    current_stream: Mutex<Option<String>>,
}

impl<C> CloudWatchLog<C> {
    pub(crate) fn new(
        client: C,
        log_group: String,
        log_stream: String,
        template: StreamTemplate,
        clock: Clock,
    ) -> Self {
        Self {
            client,
            log_group,
            log_stream,
            template,
            clock,
            current_stream: Mutex::new(None),
        }
    }

    pub fn log_group(&self) -> &str {
        &self.log_group
    }

    /// Base stream name fed to the template.
    pub fn log_stream(&self) -> &str {
        &self.log_stream
    }

    /// Stream known to exist, either created by this handle or found already
    /// there. Cleared when creating a stream fails.
    pub fn current_log_stream(&self) -> Option<String> {
        self.current_stream.lock().clone()
    }

    fn stream_name(&self) -> String {
        self.template
            .render(&self.log_group, &self.log_stream, (self.clock)())
    }
}

impl<C> CloudWatchLog<C>
where
    C: LogsApi,
{
    /// Sends a single line stamped with the current time.
    pub async fn put_simple(&self, message: impl Into<String>) -> Result<(), CloudWatchLogError> {
        let event = InputLogEvent {
            message: message.into(),
            timestamp: (self.clock)().timestamp_millis(),
        };
        self.put_log_events(vec![event]).await
    }

    pub async fn put_log_events(
        &self,
        events: Vec<InputLogEvent>,
    ) -> Result<(), CloudWatchLogError> {
        if events.is_empty() {
            return Ok(());
        }

        let log_stream = self.stream_name();
        let known = self.current_stream.lock().as_deref() == Some(log_stream.as_str());
        if !known {
            self.create_stream(&log_stream).await?;
        }

        let input = PutLogEventsRequest {
            log_events: events,
            log_group_name: self.log_group.clone(),
            log_stream_name: log_stream.clone(),
            ..Default::default()
        };
        if let Err(error) = self.client.put_log_events(input).await {
            tracing::warn!(
                log_group = %self.log_group,
                log_stream = %log_stream,
                %error,
                "failed to put log events"
            );
            return Err(CloudWatchLogError::PutLogEvents {
                log_group: self.log_group.clone(),
                log_stream,
                error,
            });
        }
        Ok(())
    }

    async fn create_stream(&self, log_stream: &str) -> Result<(), CloudWatchLogError> {
        let input = CreateLogStreamRequest {
            log_group_name: self.log_group.clone(),
            log_stream_name: log_stream.to_string(),
        };
        match self.client.create_log_stream(input).await {
            Ok(()) => {
                tracing::debug!(log_group = %self.log_group, log_stream, "created log stream");
            }
            Err(error) if error.already_exists() => {
                tracing::debug!(
                    log_group = %self.log_group,
                    log_stream,
                    "log stream already exists"
                );
            }
            Err(error) => {
                // forget the old stream so the next write retries creation
                *self.current_stream.lock() = None;
                tracing::warn!(
                    log_group = %self.log_group,
                    log_stream,
                    %error,
                    "failed to create log stream"
                );
                return Err(CloudWatchLogError::CreateLogStream {
                    log_group: self.log_group.clone(),
                    log_stream: log_stream.to_string(),
                    error,
                });
            }
        }
        *self.current_stream.lock() = Some(log_stream.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::client::mock::MockLogs;
    use crate::CloudWatchLogBuilder;

    const GROUP: &str = "/cloudwatchlogs/group";
    const STREAM: &str = "/cloudwatchlogs/stream";

    fn year_one() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()
    }

    async fn handle(client: Arc<MockLogs>) -> CloudWatchLog<Arc<MockLogs>> {
        CloudWatchLogBuilder::new(GROUP)
            .log_stream(STREAM)
            .clock(year_one)
            .with_client(client)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_simple() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;

        log.put_simple("test 1").await.unwrap();
        log.put_simple("test 2").await.unwrap();

        let stream = "/cloudwatchlogs/stream-0001-01-01-00";
        assert_eq!(
            client.events(GROUP, stream),
            Some(vec!["test 1".to_string(), "test 2".to_string()])
        );
        assert_eq!(client.state.lock().create_stream_calls, 1);
        assert_eq!(log.current_log_stream().as_deref(), Some(stream));
    }

    #[tokio::test]
    async fn test_put_simple_timestamp() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;

        log.put_simple("line").await.unwrap();

        let state = client.state.lock();
        let events = &state.groups[GROUP]["/cloudwatchlogs/stream-0001-01-01-00"];
        assert_eq!(events[0].timestamp, year_one().timestamp_millis());
    }

    #[tokio::test]
    async fn test_change_stream() {
        let now = Arc::new(Mutex::new(year_one()));
        let client = Arc::new(MockLogs::new());
        let clock = now.clone();
        let log = CloudWatchLogBuilder::new(GROUP)
            .log_stream(STREAM)
            .clock(move || *clock.lock())
            .with_client(client.clone())
            .build()
            .await
            .unwrap();

        log.put_simple("test 1").await.unwrap();
        log.put_simple("test 2").await.unwrap();
        assert_eq!(
            client
                .events(GROUP, "/cloudwatchlogs/stream-0001-01-01-00")
                .map(|e| e.len()),
            Some(2)
        );

        *now.lock() = year_one() + Duration::hours(24);

        log.put_simple("test 1").await.unwrap();
        assert_eq!(
            client.events(GROUP, "/cloudwatchlogs/stream-0001-01-02-00"),
            Some(vec!["test 1".to_string()])
        );
        assert_eq!(client.state.lock().create_stream_calls, 2);
    }

    #[tokio::test]
    async fn test_group_exists() {
        let client = Arc::new(MockLogs::new());
        {
            let log = handle(client.clone()).await;
            log.put_simple("test 1").await.unwrap();
            log.put_simple("test 2").await.unwrap();
        }

        let log = handle(client.clone()).await;
        log.put_simple("test 3").await.unwrap();
        log.put_simple("test 4").await.unwrap();

        let events = client
            .events(GROUP, "/cloudwatchlogs/stream-0001-01-01-00")
            .unwrap();
        assert_eq!(events, vec!["test 1", "test 2", "test 3", "test 4"]);
        // the second handle found the stream already there and kept it
        assert_eq!(
            log.current_log_stream().as_deref(),
            Some("/cloudwatchlogs/stream-0001-01-01-00")
        );
        assert_eq!(client.state.lock().create_stream_calls, 2);
    }

    #[tokio::test]
    async fn test_create_stream_denied() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;
        log.put_simple("ok").await.unwrap();

        client.state.lock().deny_create_stream = true;
        // a new hour forces a new stream
        let log = CloudWatchLog {
            clock: Box::new(|| year_one() + Duration::hours(1)),
            ..log
        };

        let err = log.put_simple("lost").await.unwrap_err();
        assert!(matches!(err, CloudWatchLogError::CreateLogStream { .. }));
        assert!(err.to_string().contains("stream=/cloudwatchlogs/stream-0001-01-01-01"));
        assert_eq!(log.current_log_stream(), None);
        assert_eq!(client.state.lock().put_log_calls, 1);

        client.state.lock().deny_create_stream = false;
        log.put_simple("retried").await.unwrap();
        assert_eq!(
            client.events(GROUP, "/cloudwatchlogs/stream-0001-01-01-01"),
            Some(vec!["retried".to_string()])
        );
    }

    #[tokio::test]
    async fn test_put_log_denied() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;
        client.state.lock().deny_put_log = true;

        let err = log.put_simple("lost").await.unwrap_err();
        assert!(matches!(err, CloudWatchLogError::PutLogEvents { .. }));
        // the stream itself was created fine
        assert_eq!(
            log.current_log_stream().as_deref(),
            Some("/cloudwatchlogs/stream-0001-01-01-00")
        );
    }

    #[tokio::test]
    async fn test_put_many_events() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;
        let events = vec![
            InputLogEvent {
                message: "hello - 1".to_string(),
                timestamp: 1,
            },
            InputLogEvent {
                message: "hello - 2".to_string(),
                timestamp: 2,
            },
        ];

        log.put_log_events(events).await.unwrap();

        assert_eq!(
            client.events(GROUP, "/cloudwatchlogs/stream-0001-01-01-00"),
            Some(vec!["hello - 1".to_string(), "hello - 2".to_string()])
        );
        assert_eq!(client.state.lock().put_log_calls, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_share_one_stream() {
        let client = Arc::new(MockLogs::new());
        let log = Arc::new(handle(client.clone()).await);

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.put_simple(format!("line {}", i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let state = client.state.lock();
        let streams = &state.groups[GROUP];
        assert_eq!(streams.len(), 1);
        assert_eq!(streams["/cloudwatchlogs/stream-0001-01-01-00"].len(), 20);
        assert_eq!(state.put_log_calls, 20);
    }

    #[tokio::test]
    async fn test_empty_events_are_not_sent() {
        let client = Arc::new(MockLogs::new());
        let log = handle(client.clone()).await;

        log.put_log_events(Vec::new()).await.unwrap();

        let state = client.state.lock();
        assert_eq!(state.create_stream_calls, 0);
        assert_eq!(state.put_log_calls, 0);
    }
}
