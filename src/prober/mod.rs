use std::fmt;
use std::time::Duration;

use reqwest::redirect;
use scraper::{Html, Selector};
use thiserror::Error;

use crate::utils;

pub const DEFAULT_USER_AGENT: &str = "DirScan";

/// Bytes of a response body kept for title extraction; the rest is never read.
pub const MAX_TITLE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },

    #[error("probe panicked: {message}")]
    Panicked { message: String },
}

// what ended up in the title column for a response
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Title {
    Text(String),
    Missing,
    Unavailable,
}

impl Title {
    pub fn as_str(&self) -> &str {
        match self {
            Title::Text(t) => t.as_str(),
            Title::Missing => "No Title",
            Title::Unavailable => "N/A",
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub title: Option<Title>,
}

/// The result of probing one (target, path) pair. `url` is always the
/// resolved url, even when the request itself failed.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub url: String,
    pub result: Result<ProbeResponse, ProbeError>,
}

impl ProbeOutcome {
    pub fn failed(url: String, error: ProbeError) -> Self {
        Self {
            url,
            result: Err(error),
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().map(|r| r.status)
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// builds the client a single worker reuses for all of its requests.
// redirects are reported, not followed.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirect::Policy::none())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
}

/// Issues a single GET for `target` joined with `path`.
///
/// Transport failures come back as a failed outcome and are never retried.
/// When `fetch_title` is set the first [`MAX_TITLE_BYTES`] of the body are
/// read and its `<title>` extracted; a body that cannot be read degrades the
/// title to [`Title::Unavailable`] instead of failing the probe.
pub async fn probe(
    client: &reqwest::Client,
    target: &str,
    path: &str,
    fetch_title: bool,
) -> ProbeOutcome {
    let url = utils::format_url(target, path);
    let resp = match client.get(url.as_str()).send().await {
        Ok(resp) => resp,
        Err(e) => return ProbeOutcome::failed(url, ProbeError::Request { source: e }),
    };
    let status = resp.status().as_u16();

    let title = if fetch_title {
        match read_prefix(resp, MAX_TITLE_BYTES).await {
            Ok(body) => Some(extract_title(&String::from_utf8_lossy(&body))),
            Err(e) => {
                tracing::debug!("{url}: body read failed: {e}");
                Some(Title::Unavailable)
            }
        }
    } else {
        None
    };

    ProbeOutcome {
        url,
        result: Ok(ProbeResponse { status, title }),
    }
}

async fn read_prefix(
    mut resp: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = resp.chunk().await? else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}

pub fn extract_title(body: &str) -> Title {
    let selector = match Selector::parse("title") {
        Ok(selector) => selector,
        Err(_) => return Title::Unavailable,
    };
    let document = Html::parse_document(body);
    let text: String = document
        .select(&selector)
        .flat_map(|el| el.text())
        .collect();
    let text = text.trim();
    if text.is_empty() {
        Title::Missing
    } else {
        Title::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_title() {
        let body = "<html><head><title>\n  Admin Panel \n</title></head><body></body></html>";
        assert_eq!(extract_title(body), Title::Text("Admin Panel".to_string()));
    }

    #[test]
    fn missing_title_uses_sentinel() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), Title::Missing);
        assert_eq!(extract_title("<title>   </title>"), Title::Missing);
        assert_eq!(Title::Missing.to_string(), "No Title");
    }

    #[test]
    fn garbage_body_does_not_fail() {
        let title = extract_title("\u{0}<<<not html at all>>>");
        assert_eq!(title, Title::Missing);
        assert_eq!(Title::Unavailable.as_str(), "N/A");
    }

    #[tokio::test]
    async fn unreachable_target_is_a_failed_outcome() {
        let client = build_client(&ClientConfig {
            timeout_seconds: 2,
            ..ClientConfig::default()
        })
        .unwrap();
        let outcome = probe(&client, "http://127.0.0.1:1/", "/admin", true).await;
        assert_eq!(outcome.url, "http://127.0.0.1:1/admin");
        assert!(matches!(outcome.result, Err(ProbeError::Request { .. })));
        assert_eq!(outcome.status(), None);
    }
}
