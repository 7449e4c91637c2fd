use std::fmt;
use std::path::PathBuf;

use crawl_core::{JobId, JobStatus};

/// Everything the engine reports back to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        ticket: u64,
        job_id: JobId,
    },
    SubmitFailed {
        ticket: u64,
        error: ApiError,
    },
    PollTick {
        job_id: JobId,
    },
    PollDeadlineExceeded {
        job_id: JobId,
    },
    StatusFetched {
        job_id: JobId,
        seq: u64,
        status: JobStatus,
    },
    StatusFailed {
        job_id: JobId,
        seq: u64,
        error: ApiError,
    },
    /// Archive download ended; the outcome is logged, never alerted.
    ArchiveSaved {
        job_id: JobId,
        path: PathBuf,
    },
    ArchiveFailed {
        job_id: JobId,
        message: String,
    },
    DocumentExported {
        job_id: JobId,
        path: PathBuf,
    },
    DocumentExportFailed {
        job_id: JobId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::InvalidUrl => write!(f, "invalid url"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Network => write!(f, "network error"),
            ApiErrorKind::Decode => write!(f, "malformed response"),
            ApiErrorKind::Io => write!(f, "io error"),
        }
    }
}
