use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the start and end marker of a filter line.
pub const FILTER_SEPARATOR: &str = "|||";

/// Start/end delimiter pair marking a content span for the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub start: String,
    pub end: String,
}

/// Payload for `POST /api/scrape`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub depth: u32,
    pub filters: Vec<FilterRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("depth must be a non-negative integer, got {0:?}")]
    InvalidDepth(String),
}

/// Turns raw form input into a request payload.
///
/// Only type coercion happens here; reachability and depth limits are the
/// job engine's business and come back through the status `errors` list.
pub fn build_request(
    raw_url: &str,
    raw_depth: &str,
    raw_filters: &str,
) -> Result<ScrapeRequest, RequestError> {
    let url = raw_url.trim();
    if url.is_empty() {
        return Err(RequestError::EmptyUrl);
    }
    let depth = raw_depth
        .trim()
        .parse::<u32>()
        .map_err(|_| RequestError::InvalidDepth(raw_depth.to_string()))?;

    Ok(ScrapeRequest {
        url: url.to_string(),
        depth,
        filters: parse_filters(raw_filters),
    })
}

/// Parses one rule per line. Lines without exactly one separator, or with an
/// empty side, are skipped.
pub fn parse_filters(text: &str) -> Vec<FilterRule> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_filter_line)
        .collect()
}

fn parse_filter_line(line: &str) -> Option<FilterRule> {
    let mut parts = line.split(FILTER_SEPARATOR);
    let start = parts.next()?.trim();
    let end = parts.next()?.trim();
    if parts.next().is_some() || start.is_empty() || end.is_empty() {
        return None;
    }
    Some(FilterRule {
        start: start.to_string(),
        end: end.to_string(),
    })
}
