use crate::present::RenderModel;
use crate::state::FormFields;
use crate::{JobId, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub job_id: Option<JobId>,
    pub form: FormFields,
    pub can_submit: bool,
    pub can_cancel: bool,
    pub cancel_label: &'static str,
    /// Latest applied snapshot; `None` until the first poll lands.
    pub progress: Option<RenderModel>,
    pub can_export: bool,
    pub can_export_document: bool,
    pub document_export_busy: bool,
    pub archive_downloads: u32,
    pub last_document: Option<String>,
    pub failure_message: Option<String>,
    pub dirty: bool,
}
