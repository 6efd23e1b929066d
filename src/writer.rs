use std::io;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tracing::instrument::WithSubscriber;
use tracing::subscriber::NoSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::client::LogsApi;
use crate::handle::CloudWatchLog;
use crate::{
    CLOUDWATCH_EXTRA_MSG_PAYLOAD_SIZE, CLOUDWATCH_MAX_EVENT_SIZE, WRITER_CHANNEL_CAPACITY,
};

/// [`MakeWriter`] turning every formatted line into a CloudWatch log event.
///
/// Lines are handed to a single task on the given runtime, which sends them
/// one by one with [`CloudWatchLog::put_simple`]. Failed deliveries are
/// reported on stderr and not retried.
#[derive(Clone)]
pub struct CloudWatchLogMakeWriter {
    channel: Sender<String>,
}

impl CloudWatchLogMakeWriter {
    pub fn new<C>(log: Arc<CloudWatchLog<C>>, runtime_handle: &Handle) -> Self
    where
        C: LogsApi + 'static,
    {
        let (sender, receiver) = channel(WRITER_CHANNEL_CAPACITY);
        // the handle's own events must not come back through this writer
        runtime_handle
            .spawn(forward_lines(log, receiver).with_subscriber(NoSubscriber::default()));
        Self { channel: sender }
    }
}

impl MakeWriter for CloudWatchLogMakeWriter {
    type Writer = CloudWatchLogWriter;

    fn make_writer(&self) -> Self::Writer {
        CloudWatchLogWriter::new(self.channel.clone())
    }
}

async fn forward_lines<C>(log: Arc<CloudWatchLog<C>>, mut receiver: Receiver<String>)
where
    C: LogsApi,
{
    while let Some(line) = receiver.recv().await {
        if let Err(err) = log.put_simple(line).await {
            eprintln!("Failed to send log line to CloudWatch: {}", err);
        }
    }
}

pub struct CloudWatchLogWriter {
    line_writer: io::LineWriter<Inner>,
}

impl CloudWatchLogWriter {
    fn new(channel: Sender<String>) -> Self {
        let line_writer = io::LineWriter::new(Inner { channel });
        Self { line_writer }
    }
}

impl io::Write for CloudWatchLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.line_writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.line_writer.flush()
    }

    // whole lines reach `Inner` in one call
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.line_writer.write_all(buf)
    }
}

struct Inner {
    channel: Sender<String>,
}

impl io::Write for Inner {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let buf_len = buf.len();
        let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
        if buf.is_empty() {
            return Ok(buf_len);
        }

        let message = std::str::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let message = truncate(
            message,
            CLOUDWATCH_MAX_EVENT_SIZE - CLOUDWATCH_EXTRA_MSG_PAYLOAD_SIZE,
        );

        match self.channel.try_send(message.to_string()) {
            Ok(()) => Ok(buf_len),
            Err(TrySendError::Full(_)) => {
                eprintln!("CloudWatch log channel is full, line dropped");
                Ok(buf_len)
            }
            Err(TrySendError::Closed(_)) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "CloudWatch log forwarding task has stopped",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Cuts `message` to at most `max` bytes without splitting a character.
fn truncate(message: &str, max: usize) -> &str {
    if message.len() <= max {
        return message;
    }
    eprintln!("Message size exceeds max payload size, truncated");
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
