use crate::{JobState, JobStatus};

/// Everything needed to draw the progress panel for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    pub status_label: String,
    pub progress_percent: u8,
    pub activity_line: Option<String>,
    pub pages_downloaded: u64,
    pub total_pages: String,
    pub current_url: String,
    pub errors: Vec<String>,
}

/// Maps a status snapshot to display data. Pure; the previous snapshot plays no part.
pub fn present(snapshot: &JobStatus) -> RenderModel {
    let total_pages = snapshot
        .total_pages
        .map(|total| total.to_string())
        .unwrap_or_else(|| "?".to_string());

    let activity_line = match snapshot.status {
        JobState::InProgress => Some(format!(
            "Downloading... ({}/{})",
            snapshot.pages_downloaded, total_pages
        )),
        JobState::Completed => Some("Scraping completed".to_string()),
        JobState::Failed => Some("Scraping failed".to_string()),
        JobState::Started | JobState::Other(_) => None,
    };

    RenderModel {
        status_label: status_label(&snapshot.status).to_string(),
        progress_percent: snapshot.progress.clamp(0, 100) as u8,
        activity_line,
        pages_downloaded: snapshot.pages_downloaded,
        total_pages,
        current_url: snapshot
            .current_url
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        errors: snapshot.errors.clone(),
    }
}

pub fn status_label(state: &JobState) -> &str {
    match state {
        JobState::Started => "Started",
        JobState::InProgress => "In progress",
        JobState::Completed => "Completed",
        JobState::Failed => "Failed",
        JobState::Other(raw) => raw,
    }
}
