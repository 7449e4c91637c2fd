use crate::request::build_request;
use crate::{AppState, Effect, JobState, Msg, Phase};

pub const JOB_FAILED_MESSAGE: &str = "Scraping failed";
pub const POLL_TIMEOUT_MESSAGE: &str = "Timed out waiting for the job to finish";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(text) => {
            if state.phase() == Phase::Idle {
                state.form_mut().url = text;
            }
            Vec::new()
        }
        Msg::DepthChanged(text) => {
            if state.phase() == Phase::Idle {
                state.form_mut().depth = text;
            }
            Vec::new()
        }
        Msg::FiltersChanged(text) => {
            if state.phase() == Phase::Idle {
                state.form_mut().filters = text;
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.phase() != Phase::Idle {
                return (state, Vec::new());
            }
            let form = state.form();
            match build_request(&form.url, &form.depth, &form.filters) {
                Ok(request) => {
                    let ticket = state.begin_submission();
                    vec![Effect::SubmitJob { ticket, request }]
                }
                Err(err) => vec![Effect::ShowAlert {
                    message: format!("Error: {err}"),
                }],
            }
        }
        Msg::SubmitAccepted { ticket, job_id } => {
            if !state.is_pending_ticket(ticket) {
                return (state, Vec::new());
            }
            state.accept_submission(job_id.clone());
            // The engine poller fires its first tick immediately.
            vec![Effect::StartPolling { job_id }]
        }
        Msg::SubmitRejected { ticket, message } => {
            if !state.is_pending_ticket(ticket) {
                return (state, Vec::new());
            }
            state.reject_submission();
            vec![Effect::ShowAlert {
                message: format!("Error: {message}"),
            }]
        }
        Msg::PollTick { job_id } => {
            if state.phase() != Phase::Polling || !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            let seq = state.next_seq();
            vec![Effect::FetchStatus { job_id, seq }]
        }
        Msg::StatusReceived {
            job_id,
            seq,
            status,
        } => {
            // Late replies for an old job, a finished job, or an older request are dropped.
            if state.phase() != Phase::Polling || !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            let terminal = match status.status {
                JobState::Completed => Some((Phase::Completed, None)),
                JobState::Failed => Some((Phase::Failed, Some(JOB_FAILED_MESSAGE.to_string()))),
                _ => None,
            };
            if !state.apply_snapshot(seq, status) {
                return (state, Vec::new());
            }
            match terminal {
                Some((phase, message)) => stop_effects(state.finish(phase, message)),
                None => Vec::new(),
            }
        }
        Msg::PollDeadlineExceeded { job_id } => {
            if state.phase() != Phase::Polling || !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            let was_polling = state.finish(Phase::Failed, Some(POLL_TIMEOUT_MESSAGE.to_string()));
            stop_effects(was_polling)
        }
        Msg::CancelClicked => match state.phase() {
            Phase::Submitting | Phase::Polling | Phase::Failed => stop_effects(state.reset()),
            Phase::Idle | Phase::Completed => Vec::new(),
        },
        Msg::ResetClicked => stop_effects(state.reset()),
        Msg::ArchiveExportClicked => match export_target(&state) {
            Some(job_id) => {
                state.begin_archive_download();
                vec![Effect::DownloadArchive { job_id }]
            }
            None => Vec::new(),
        },
        Msg::DocumentExportClicked => {
            if state.document_export_busy() {
                return (state, Vec::new());
            }
            match export_target(&state) {
                Some(job_id) => {
                    state.begin_document_export();
                    vec![Effect::ExportDocument { job_id }]
                }
                None => Vec::new(),
            }
        }
        Msg::DocumentExportFinished { job_id, result } => {
            if !state.document_export_busy() || !state.is_current_job(&job_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(file_name) => {
                    state.finish_document_export(Some(file_name));
                    Vec::new()
                }
                Err(message) => {
                    state.finish_document_export(None);
                    vec![Effect::ShowAlert {
                        message: format!("PDF export error: {message}"),
                    }]
                }
            }
        }
        Msg::ArchiveExportFinished { job_id: _ } => {
            state.finish_archive_download();
            Vec::new()
        }
    };

    (state, effects)
}

fn export_target(state: &AppState) -> Option<crate::JobId> {
    if state.phase() == Phase::Completed {
        state.job_id().cloned()
    } else {
        None
    }
}

fn stop_effects(was_polling: bool) -> Vec<Effect> {
    if was_polling {
        vec![Effect::StopPolling]
    } else {
        Vec::new()
    }
}
