use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cloudwatch_log::{CloudWatchLogMakeWriter, InputLogEvent};
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let log = cloudwatch_log::builder("/cloudwatchlogs/example")
        .log_stream("/cloudwatchlogs/example")
        .default_client()
        .build()
        .await?;

    let now = Utc::now().timestamp_millis();
    let events = vec![
        InputLogEvent {
            message: "hello cloudwatch_log example - 1".to_string(),
            timestamp: now,
        },
        InputLogEvent {
            message: "hello cloudwatch_log example - 2".to_string(),
            timestamp: now,
        },
    ];
    if let Err(err) = log.put_log_events(events).await {
        eprintln!("log failed: {}", err);
    }

    let make_writer = CloudWatchLogMakeWriter::new(Arc::new(log), &Handle::current());
    tracing_subscriber::fmt().with_writer(make_writer).try_init()?;
    tracing::info!(attempt = 3, "hello through tracing");

    // let the forwarding task drain
    tokio::time::sleep(Duration::from_secs(2)).await;
    Ok(())
}
