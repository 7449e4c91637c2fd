use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use crawl_core::{JobId, ScrapeRequest};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::api::{ApiSettings, JobApi, ReqwestJobApi};
use crate::persist::{export_file_name, AtomicFileWriter};
use crate::poller::{PollSettings, Poller};
use crate::{ApiError, EngineEvent};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("api client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll: PollSettings,
    pub output_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            poll: PollSettings::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Submit { ticket: u64, request: ScrapeRequest },
    StartPolling { job_id: JobId },
    StopPolling,
    FetchStatus { job_id: JobId, seq: u64 },
    DownloadArchive { job_id: JobId },
    ExportDocument { job_id: JobId },
}

/// Receives engine events; implemented by whoever drives the controller.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs commands on a background tokio runtime and hands events back over a channel.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let api = ReqwestJobApi::new(&settings.api)?;
        Ok(Self::with_api(
            Arc::new(api),
            settings.poll,
            settings.output_dir,
        )?)
    }

    pub fn with_api(
        api: Arc<dyn JobApi>,
        poll: PollSettings,
        output_dir: PathBuf,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let mut poller = Poller::new(poll, runtime.handle().clone());
            let output_dir = Arc::new(output_dir);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { job_id } => {
                        poller.start(job_id, sink.clone());
                    }
                    EngineCommand::StopPolling => {
                        if !poller.stop() {
                            engine_debug!("StopPolling with no active poller");
                        }
                    }
                    command => {
                        let api = api.clone();
                        let sink = sink.clone();
                        let output_dir = output_dir.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), command, sink.as_ref(), &output_dir)
                                .await;
                        });
                    }
                }
            }
            // Handle dropped: stop the timer before the runtime goes away.
            poller.stop();
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    api: &dyn JobApi,
    command: EngineCommand,
    sink: &dyn EventSink,
    output_dir: &std::path::Path,
) {
    match command {
        EngineCommand::Submit { ticket, request } => {
            engine_info!(
                "Submitting url={} depth={} filters={}",
                request.url,
                request.depth,
                request.filters.len()
            );
            match api.submit(&request).await {
                Ok(job_id) => sink.emit(EngineEvent::Submitted { ticket, job_id }),
                Err(error) => {
                    engine_warn!("Submission rejected: {}", error);
                    sink.emit(EngineEvent::SubmitFailed { ticket, error });
                }
            }
        }
        EngineCommand::FetchStatus { job_id, seq } => match api.status(&job_id).await {
            Ok(status) => sink.emit(EngineEvent::StatusFetched {
                job_id,
                seq,
                status,
            }),
            Err(error) => sink.emit(EngineEvent::StatusFailed { job_id, seq, error }),
        },
        EngineCommand::DownloadArchive { job_id } => {
            match download_archive(api, &job_id, output_dir).await {
                Ok(path) => {
                    engine_info!("Archive for {} saved to {:?}", job_id, path);
                    sink.emit(EngineEvent::ArchiveSaved { job_id, path });
                }
                Err(message) => {
                    engine_error!("Archive export for {} failed: {}", job_id, message);
                    sink.emit(EngineEvent::ArchiveFailed { job_id, message });
                }
            }
        }
        EngineCommand::ExportDocument { job_id } => {
            match export_document(api, &job_id, output_dir).await {
                Ok(path) => {
                    engine_info!("Document for {} saved to {:?}", job_id, path);
                    sink.emit(EngineEvent::DocumentExported { job_id, path });
                }
                Err(message) => {
                    engine_warn!("Document export for {} failed: {}", job_id, message);
                    sink.emit(EngineEvent::DocumentExportFailed { job_id, message });
                }
            }
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling => {
            engine_error!("Poller command reached the async executor");
        }
    }
}

async fn download_archive(
    api: &dyn JobApi,
    job_id: &JobId,
    output_dir: &std::path::Path,
) -> Result<PathBuf, String> {
    let file_name = export_file_name(job_id.as_str(), "zip").map_err(|err| err.to_string())?;
    let mut pending = AtomicFileWriter::new(output_dir.to_path_buf())
        .begin(&file_name)
        .map_err(|err| err.to_string())?;
    let bytes = api
        .fetch_archive(job_id, pending.file_mut())
        .await
        .map_err(|err| err.to_string())?;
    engine_debug!("Archive for {} complete, {} bytes", job_id, bytes);
    pending.commit().map_err(|err| err.to_string())
}

async fn export_document(
    api: &dyn JobApi,
    job_id: &JobId,
    output_dir: &std::path::Path,
) -> Result<PathBuf, String> {
    let document = api
        .export_document(job_id)
        .await
        .map_err(|err| err.to_string())?;
    let file_name = export_file_name(job_id.as_str(), "pdf").map_err(|err| err.to_string())?;
    AtomicFileWriter::new(output_dir.to_path_buf())
        .write(&file_name, &document)
        .map_err(|err| err.to_string())
}
