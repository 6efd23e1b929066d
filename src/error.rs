use std::error::Error;
use std::fmt;

use rusoto_core::RusotoError;
use rusoto_logs::{
    CreateLogGroupError, CreateLogStreamError, PutLogEventsError, PutRetentionPolicyError,
};

use crate::template::TemplateError;

#[derive(Debug)]
pub enum CloudWatchLogError {
    MissingLogGroup,
    Template(TemplateError),
    CreateLogGroup {
        log_group: String,
        error: RusotoError<CreateLogGroupError>,
    },
    PutRetentionPolicy {
        log_group: String,
        retention_in_days: i64,
        error: RusotoError<PutRetentionPolicyError>,
    },
    CreateLogStream {
        log_group: String,
        log_stream: String,
        error: RusotoError<CreateLogStreamError>,
    },
    PutLogEvents {
        log_group: String,
        log_stream: String,
        error: RusotoError<PutLogEventsError>,
    },
}

impl From<TemplateError> for CloudWatchLogError {
    fn from(error: TemplateError) -> Self {
        Self::Template(error)
    }
}

impl fmt::Display for CloudWatchLogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CloudWatchLogError::MissingLogGroup => write!(f, "log group is required"),
            CloudWatchLogError::Template(err) => write!(f, "log stream template error: {}", err),
            CloudWatchLogError::CreateLogGroup { log_group, error } => {
                write!(f, "create group error: {}: {}", log_group, error)
            }
            CloudWatchLogError::PutRetentionPolicy {
                log_group,
                retention_in_days,
                error,
            } => write!(
                f,
                "put group retention error: group={} retention={}: {}",
                log_group, retention_in_days, error
            ),
            CloudWatchLogError::CreateLogStream {
                log_group,
                log_stream,
                error,
            } => write!(
                f,
                "create log stream error: group={} stream={}: {}",
                log_group, log_stream, error
            ),
            CloudWatchLogError::PutLogEvents {
                log_group,
                log_stream,
                error,
            } => write!(
                f,
                "put log events error: group={} stream={}: {}",
                log_group, log_stream, error
            ),
        }
    }
}

impl Error for CloudWatchLogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CloudWatchLogError::MissingLogGroup => None,
            CloudWatchLogError::Template(ref err) => Some(err),
            CloudWatchLogError::CreateLogGroup { ref error, .. } => Some(error),
            CloudWatchLogError::PutRetentionPolicy { ref error, .. } => Some(error),
            CloudWatchLogError::CreateLogStream { ref error, .. } => Some(error),
            CloudWatchLogError::PutLogEvents { ref error, .. } => Some(error),
        }
    }
}

/// Whether a failed create call only says the resource is already there.
pub(crate) trait AlreadyExists {
    fn already_exists(&self) -> bool;
}

impl AlreadyExists for RusotoError<CreateLogGroupError> {
    fn already_exists(&self) -> bool {
        matches!(
            self,
            RusotoError::Service(CreateLogGroupError::ResourceAlreadyExists(_))
        )
    }
}

impl AlreadyExists for RusotoError<CreateLogStreamError> {
    fn already_exists(&self) -> bool {
        matches!(
            self,
            RusotoError::Service(CreateLogStreamError::ResourceAlreadyExists(_))
        )
    }
}
