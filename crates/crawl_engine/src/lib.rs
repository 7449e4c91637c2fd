//! Crawl engine: HTTP client for the job engine, status poller, and export persistence.
mod api;
mod engine;
mod persist;
mod poller;
mod types;

pub use api::{ApiSettings, JobApi, ReqwestJobApi, SUBMIT_FALLBACK_MESSAGE};
pub use engine::{
    ChannelEventSink, EngineCommand, EngineError, EngineHandle, EngineSettings, EventSink,
};
pub use persist::{ensure_output_dir, export_file_name, AtomicFileWriter, PendingFile, PersistError};
pub use poller::{PollSettings, Poller};
pub use types::{ApiError, ApiErrorKind, EngineEvent};
