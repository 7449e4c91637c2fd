use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the seed URL field.
    UrlChanged(String),
    /// User edited the depth field (raw text, coerced on submit).
    DepthChanged(String),
    /// User edited the filter rules text (one rule per line).
    FiltersChanged(String),
    /// User submitted the form.
    SubmitClicked,
    /// Engine accepted the submission with the given ticket.
    SubmitAccepted { ticket: u64, job_id: JobId },
    /// Engine rejected the submission; `message` is shown to the user.
    SubmitRejected { ticket: u64, message: String },
    /// Poll timer fired for a job.
    PollTick { job_id: JobId },
    /// A status fetch tagged with `seq` came back.
    StatusReceived {
        job_id: JobId,
        seq: u64,
        status: JobStatus,
    },
    /// The poller gave up after its configured wall-clock bound.
    PollDeadlineExceeded { job_id: JobId },
    /// User cancelled the running job view.
    CancelClicked,
    /// User asked for a fresh form ("new scrape" / "back").
    ResetClicked,
    /// User clicked the archive (zip) export.
    ArchiveExportClicked,
    /// User clicked the document (pdf) export.
    DocumentExportClicked,
    /// Document export request ended, either with the saved file name or an error.
    DocumentExportFinished {
        job_id: JobId,
        result: Result<String, String>,
    },
    /// An archive download ended. Its outcome is only logged by the engine.
    ArchiveExportFinished { job_id: JobId },
}
