use crate::{JobId, ScrapeRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob { ticket: u64, request: ScrapeRequest },
    StartPolling { job_id: JobId },
    StopPolling,
    FetchStatus { job_id: JobId, seq: u64 },
    DownloadArchive { job_id: JobId },
    ExportDocument { job_id: JobId },
    ShowAlert { message: String },
}
