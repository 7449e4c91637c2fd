use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crawl_core::{Effect, Msg};
use crawl_engine::{ApiErrorKind, EngineCommand, EngineEvent, EngineHandle, EngineSettings};
use engine_logging::{engine_debug, engine_info, engine_warn};

use super::app::AppInput;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings, input_tx: mpsc::Sender<AppInput>) -> anyhow::Result<Self> {
        engine_info!(
            "Engine base_url={} poll_interval={:?} output_dir={:?}",
            settings.api.base_url,
            settings.poll.interval,
            settings.output_dir
        );
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine };
        runner.spawn_event_loop(input_tx);
        Ok(runner)
    }

    /// Hands effects to the engine. Alerts are returned for the UI to show.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<String> {
        let mut alerts = Vec::new();
        for effect in effects {
            match to_command(effect) {
                Ok(command) => {
                    engine_debug!("Engine command {:?}", command);
                    self.engine.send(command);
                }
                Err(message) => alerts.push(message),
            }
        }
        alerts
    }

    fn spawn_event_loop(&self, input_tx: mpsc::Sender<AppInput>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.recv_timeout(Duration::from_millis(100)) {
                if let Some(msg) = to_msg(event) {
                    if input_tx.send(AppInput::Engine(msg)).is_err() {
                        break;
                    }
                }
            }
        });
    }
}

/// Engine command for an effect, or the alert text for `ShowAlert`.
fn to_command(effect: Effect) -> Result<EngineCommand, String> {
    match effect {
        Effect::SubmitJob { ticket, request } => Ok(EngineCommand::Submit { ticket, request }),
        Effect::StartPolling { job_id } => Ok(EngineCommand::StartPolling { job_id }),
        Effect::StopPolling => Ok(EngineCommand::StopPolling),
        Effect::FetchStatus { job_id, seq } => Ok(EngineCommand::FetchStatus { job_id, seq }),
        Effect::DownloadArchive { job_id } => {
            engine_info!("DownloadArchive job_id={}", job_id);
            Ok(EngineCommand::DownloadArchive { job_id })
        }
        Effect::ExportDocument { job_id } => Ok(EngineCommand::ExportDocument { job_id }),
        Effect::ShowAlert { message } => Err(message),
    }
}

fn to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Submitted { ticket, job_id } => {
            engine_info!("Job {} accepted (ticket {})", job_id, ticket);
            Some(Msg::SubmitAccepted { ticket, job_id })
        }
        EngineEvent::SubmitFailed { ticket, error } => {
            let message = match error.kind {
                ApiErrorKind::HttpStatus(_) => error.message,
                _ => error.to_string(),
            };
            Some(Msg::SubmitRejected { ticket, message })
        }
        EngineEvent::PollTick { job_id } => Some(Msg::PollTick { job_id }),
        EngineEvent::PollDeadlineExceeded { job_id } => Some(Msg::PollDeadlineExceeded { job_id }),
        EngineEvent::StatusFetched {
            job_id,
            seq,
            status,
        } => Some(Msg::StatusReceived {
            job_id,
            seq,
            status,
        }),
        EngineEvent::StatusFailed { job_id, seq, error } => {
            // Transient: the next tick tries again.
            engine_warn!("Polling error for {} (seq {}): {}", job_id, seq, error);
            None
        }
        // Outcome already logged by the engine; the controller only counts it.
        EngineEvent::ArchiveSaved { job_id, .. } | EngineEvent::ArchiveFailed { job_id, .. } => {
            Some(Msg::ArchiveExportFinished { job_id })
        }
        EngineEvent::DocumentExported { job_id, path } => {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Some(Msg::DocumentExportFinished {
                job_id,
                result: Ok(file_name),
            })
        }
        EngineEvent::DocumentExportFailed { job_id, message } => Some(Msg::DocumentExportFinished {
            job_id,
            result: Err(message),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crawl_core::{JobId, JobStatus};
    use crawl_engine::ApiError;

    use super::*;

    #[test]
    fn alerts_are_not_engine_commands() {
        assert_eq!(
            to_command(Effect::ShowAlert {
                message: "Error: boom".into()
            }),
            Err("Error: boom".to_string())
        );
        assert_eq!(
            to_command(Effect::FetchStatus {
                job_id: JobId::new("abc123"),
                seq: 4
            }),
            Ok(EngineCommand::FetchStatus {
                job_id: JobId::new("abc123"),
                seq: 4
            })
        );
    }

    #[test]
    fn status_failures_are_swallowed() {
        let event = EngineEvent::StatusFailed {
            job_id: JobId::new("abc123"),
            seq: 2,
            error: ApiError {
                kind: ApiErrorKind::HttpStatus(503),
                message: "503 Service Unavailable".into(),
            },
        };
        assert_eq!(to_msg(event), None);
    }

    #[test]
    fn rejection_uses_server_text_for_http_errors() {
        let http = EngineEvent::SubmitFailed {
            ticket: 1,
            error: ApiError {
                kind: ApiErrorKind::HttpStatus(400),
                message: "Depth must be between 1 and 5".into(),
            },
        };
        assert_eq!(
            to_msg(http),
            Some(Msg::SubmitRejected {
                ticket: 1,
                message: "Depth must be between 1 and 5".into()
            })
        );

        let network = EngineEvent::SubmitFailed {
            ticket: 2,
            error: ApiError {
                kind: ApiErrorKind::Network,
                message: "connection refused".into(),
            },
        };
        assert_eq!(
            to_msg(network),
            Some(Msg::SubmitRejected {
                ticket: 2,
                message: "network error: connection refused".into()
            })
        );
    }

    #[test]
    fn exported_document_reports_file_name() {
        let event = EngineEvent::DocumentExported {
            job_id: JobId::new("abc123"),
            path: PathBuf::from("output").join("abc123.pdf"),
        };
        assert_eq!(
            to_msg(event),
            Some(Msg::DocumentExportFinished {
                job_id: JobId::new("abc123"),
                result: Ok("abc123.pdf".into())
            })
        );
    }

    #[test]
    fn archive_outcomes_only_finish_the_download() {
        let saved = EngineEvent::ArchiveSaved {
            job_id: JobId::new("abc123"),
            path: PathBuf::from("output").join("abc123.zip"),
        };
        let failed = EngineEvent::ArchiveFailed {
            job_id: JobId::new("abc123"),
            message: "http status 404: 404 Not Found".into(),
        };
        let finished = Some(Msg::ArchiveExportFinished {
            job_id: JobId::new("abc123"),
        });

        assert_eq!(to_msg(saved), finished);
        assert_eq!(to_msg(failed), finished);
    }

    #[test]
    fn status_snapshots_keep_their_sequence() {
        let event = EngineEvent::StatusFetched {
            job_id: JobId::new("abc123"),
            seq: 9,
            status: JobStatus::default(),
        };
        assert_eq!(
            to_msg(event),
            Some(Msg::StatusReceived {
                job_id: JobId::new("abc123"),
                seq: 9,
                status: JobStatus::default()
            })
        );
    }
}
