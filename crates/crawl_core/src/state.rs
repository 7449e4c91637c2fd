use crate::present::present;
use crate::view_model::AppViewModel;
use crate::{JobId, JobStatus, Phase};

pub const DEFAULT_DEPTH: &str = "1";

/// Raw form input, kept verbatim until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub url: String,
    pub depth: String,
    pub filters: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            url: String::new(),
            depth: DEFAULT_DEPTH.to_string(),
            filters: String::new(),
        }
    }
}

/// Everything the controller knows about the single current job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    form: FormFields,
    phase: Phase,
    job_id: Option<JobId>,
    snapshot: Option<JobStatus>,
    polling: bool,
    issued_seq: u64,
    applied_seq: u64,
    issued_ticket: u64,
    pending_ticket: Option<u64>,
    document_export_busy: bool,
    archive_downloads: u32,
    last_document: Option<String>,
    failure_message: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn snapshot(&self) -> Option<&JobStatus> {
        self.snapshot.as_ref()
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Sequence number of the last status snapshot that was applied.
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn document_export_busy(&self) -> bool {
        self.document_export_busy
    }

    /// Archive downloads handed to the engine that have not reported back yet.
    pub fn archive_downloads(&self) -> u32 {
        self.archive_downloads
    }

    pub fn view(&self) -> AppViewModel {
        let can_export = self.phase == Phase::Completed && self.job_id.is_some();
        AppViewModel {
            phase: self.phase,
            job_id: self.job_id.clone(),
            form: self.form.clone(),
            can_submit: self.phase == Phase::Idle,
            can_cancel: matches!(
                self.phase,
                Phase::Submitting | Phase::Polling | Phase::Failed
            ),
            cancel_label: if self.phase == Phase::Failed {
                "Back"
            } else {
                "Cancel"
            },
            progress: self.snapshot.as_ref().map(present),
            can_export,
            can_export_document: can_export && !self.document_export_busy,
            document_export_busy: self.document_export_busy,
            archive_downloads: self.archive_downloads,
            last_document: self.last_document.clone(),
            failure_message: self.failure_message.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn form_mut(&mut self) -> &mut FormFields {
        self.dirty = true;
        &mut self.form
    }

    pub(crate) fn begin_submission(&mut self) -> u64 {
        self.issued_ticket += 1;
        self.pending_ticket = Some(self.issued_ticket);
        self.phase = Phase::Submitting;
        self.dirty = true;
        self.issued_ticket
    }

    pub(crate) fn is_pending_ticket(&self, ticket: u64) -> bool {
        self.phase == Phase::Submitting && self.pending_ticket == Some(ticket)
    }

    pub(crate) fn accept_submission(&mut self, job_id: JobId) {
        self.pending_ticket = None;
        self.job_id = Some(job_id);
        self.snapshot = None;
        self.issued_seq = 0;
        self.applied_seq = 0;
        self.phase = Phase::Polling;
        self.polling = true;
        self.dirty = true;
    }

    pub(crate) fn reject_submission(&mut self) {
        self.pending_ticket = None;
        self.phase = Phase::Idle;
        self.dirty = true;
    }

    pub(crate) fn is_current_job(&self, job_id: &JobId) -> bool {
        self.job_id.as_ref() == Some(job_id)
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Applies a snapshot if it is newer than the last applied one.
    pub(crate) fn apply_snapshot(&mut self, seq: u64, status: JobStatus) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.snapshot = Some(status);
        self.dirty = true;
        true
    }

    /// Leaves `Polling` for a terminal phase. Returns whether the poller was
    /// still marked active.
    pub(crate) fn finish(&mut self, phase: Phase, failure_message: Option<String>) -> bool {
        self.phase = phase;
        self.failure_message = failure_message;
        self.dirty = true;
        std::mem::take(&mut self.polling)
    }

    /// Drops the current job and returns to a blank form. Returns whether the
    /// poller was still marked active.
    pub(crate) fn reset(&mut self) -> bool {
        let was_polling = self.polling;
        let issued_ticket = self.issued_ticket;
        let archive_downloads = self.archive_downloads;
        *self = Self {
            issued_ticket,
            archive_downloads,
            dirty: true,
            ..Self::default()
        };
        was_polling
    }

    pub(crate) fn begin_archive_download(&mut self) {
        self.archive_downloads += 1;
        self.dirty = true;
    }

    pub(crate) fn finish_archive_download(&mut self) {
        self.archive_downloads = self.archive_downloads.saturating_sub(1);
        self.dirty = true;
    }

    pub(crate) fn begin_document_export(&mut self) {
        self.document_export_busy = true;
        self.dirty = true;
    }

    pub(crate) fn finish_document_export(&mut self, saved: Option<String>) {
        self.document_export_busy = false;
        if saved.is_some() {
            self.last_document = saved;
        }
        self.dirty = true;
    }
}
