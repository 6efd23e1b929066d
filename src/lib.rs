//! Ship log lines to an AWS CloudWatch Logs group.
//!
//! [`CloudWatchLogBuilder::build`] makes sure the log group exists and sets
//! its retention. The resulting [`CloudWatchLog`] writes events to a stream
//! named from a template such as `{LogStream}-{YYYY}-{MM}-{DD}-{HH}`,
//! creating each stream the first time it is used.
//!
//! Every call is attempted once; errors go back to the caller.

mod builder;
mod client;
mod error;
mod handle;
mod template;
mod writer;

/// Events larger than this are rejected by CloudWatch.
const CLOUDWATCH_MAX_EVENT_SIZE: usize = 256 * 1024;
const CLOUDWATCH_EXTRA_MSG_PAYLOAD_SIZE: usize = 26;
const WRITER_CHANNEL_CAPACITY: usize = 10_000;

pub const DEFAULT_LOG_STREAM_TEMPLATE: &str = "{LogStream}-{YYYY}-{MM}-{DD}-{HH}";
pub const DEFAULT_RETENTION_IN_DAYS: i64 = 30;

pub use builder::CloudWatchLogBuilder;
pub use client::LogsApi;
pub use error::CloudWatchLogError;
pub use handle::CloudWatchLog;
pub use rusoto_logs::InputLogEvent;
pub use template::{StreamTemplate, TemplateError};
pub use writer::{CloudWatchLogMakeWriter, CloudWatchLogWriter};

pub fn builder(log_group: &str) -> CloudWatchLogBuilder<()> {
    CloudWatchLogBuilder::new(log_group)
}
