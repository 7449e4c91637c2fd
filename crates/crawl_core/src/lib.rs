//! Crawl core: pure job-lifecycle state machine and view-model helpers.
mod effect;
mod job;
mod msg;
mod present;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use job::{JobId, JobState, JobStatus, Phase};
pub use msg::Msg;
pub use present::{present, status_label, RenderModel};
pub use request::{
    build_request, parse_filters, FilterRule, RequestError, ScrapeRequest, FILTER_SEPARATOR,
};
pub use state::{AppState, FormFields, DEFAULT_DEPTH};
pub use update::{update, JOB_FAILED_MESSAGE, POLL_TIMEOUT_MESSAGE};
pub use view_model::AppViewModel;
