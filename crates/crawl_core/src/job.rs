use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier the job engine hands back for a submitted crawl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job state as reported by the engine. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    #[default]
    Started,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl JobState {
    pub fn as_wire(&self) -> &str {
        match self {
            JobState::Started => "started",
            JobState::InProgress => "in_progress",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "started" => JobState::Started,
            "in_progress" => JobState::InProgress,
            "completed" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Other(raw),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_wire().to_string()
    }
}

/// One status snapshot returned by `GET /api/project/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: JobState,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub progress: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub pages_downloaded: u64,
    #[serde(default, deserialize_with = "lenient_optional_u64")]
    pub total_pages: Option<u64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub current_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<String>,
}

/// Any JSON number; the engine is not strict about integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Int(i64),
    Float(f64),
}

impl WireNumber {
    fn rounded(self) -> i64 {
        match self {
            WireNumber::Int(value) => value,
            // `as` saturates, and NaN becomes 0.
            WireNumber::Float(value) => value.round() as i64,
        }
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<WireNumber>::deserialize(deserializer)?;
    Ok(value.map(WireNumber::rounded).unwrap_or(0))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_u64(deserializer)?.unwrap_or(0))
}

fn lenient_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<WireNumber>::deserialize(deserializer)?;
    Ok(value.map(|number| number.rounded().max(0) as u64))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Coarse UI phase derived from the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}
