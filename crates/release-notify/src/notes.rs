//! Release notes: fetching from the GitHub "generate notes" endpoint,
//! truncation, and JSON-safe escaping.

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::NotesConfig;
use crate::{Error, Result};

/// Appended to notes cut at the configured maximum length.
pub const TRUNCATION_MARKER: &str = "\n…_(release notes truncated)_";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Release notes text, after fallback substitution and truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    text: String,
    truncated: bool,
}

impl ReleaseNotes {
    /// Build notes from the raw upstream body.
    ///
    /// A missing or blank body is replaced by `fallback` as-is. Anything longer
    /// than `max_length` characters is cut to exactly `max_length` characters
    /// and gets [`TRUNCATION_MARKER`] appended.
    pub fn new(raw: Option<&str>, max_length: usize, fallback: &str) -> Self {
        let raw = match raw {
            Some(body) if !body.trim().is_empty() => body,
            _ => {
                return Self {
                    text: fallback.to_string(),
                    truncated: false,
                };
            }
        };

        match raw.char_indices().nth(max_length) {
            Some((cut, _)) => {
                let mut text = String::with_capacity(cut + TRUNCATION_MARKER.len());
                text.push_str(&raw[..cut]);
                text.push_str(TRUNCATION_MARKER);
                Self {
                    text,
                    truncated: true,
                }
            }
            None => Self {
                text: raw.to_string(),
                truncated: false,
            },
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The notes as the inside of a JSON string literal.
    ///
    /// Quotes, backslashes and control characters are escaped, so the result
    /// can be spliced between `"` in any JSON document and parses back to
    /// [`text`](Self::text).
    pub fn escaped(&self) -> String {
        escape_json_string(&self.text)
    }
}

/// Escape `raw` for embedding inside a JSON string literal (no surrounding
/// quotes).
pub fn escape_json_string(raw: &str) -> String {
    let quoted = Value::String(raw.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[derive(Debug, Serialize)]
struct GenerateNotesRequest<'a> {
    tag_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_commitish: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_tag_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateNotesResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Client for the host's release-notes generation API.
pub struct NotesFetcher {
    client: Client,
    config: NotesConfig,
}

impl NotesFetcher {
    pub fn new(client: Client, config: NotesConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    fn endpoint(&self, repository: &str) -> String {
        format!(
            "{}/repos/{}/releases/generate-notes",
            self.config.api_url.trim_end_matches('/'),
            repository
        )
    }

    /// Ask the host to generate notes for `tag` in `repository` (`owner/name`).
    ///
    /// Any network, HTTP or decoding failure is returned as
    /// [`Error::UpstreamFetch`]; nothing is retried.
    pub async fn fetch(&self, repository: &str, tag: &str) -> Result<ReleaseNotes> {
        validate_repository(repository)?;
        if tag.trim().is_empty() {
            return Err(Error::missing("tag"));
        }

        let url = self.endpoint(repository);
        let request_body = GenerateNotesRequest {
            tag_name: tag,
            target_commitish: non_blank(self.config.target_commit.as_deref()),
            previous_tag_name: non_blank(self.config.previous_tag.as_deref()),
        };

        debug!(url = %url, tag = %tag, "Requesting generated release notes");

        let mut request = self
            .client
            .post(&url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&request_body);
        if let Some(token) = non_blank(self.config.token.as_deref()) {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::upstream(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!("{} - {}", status, body)));
        }

        let generated: GenerateNotesResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("invalid response body: {}", e)))?;

        let notes = ReleaseNotes::new(
            generated.body.as_deref(),
            self.config.max_length,
            &self.config.fallback,
        );

        info!(
            repository = %repository,
            tag = %tag,
            name = generated.name.as_deref().unwrap_or_default(),
            chars = notes.char_len(),
            truncated = notes.is_truncated(),
            "Fetched release notes"
        );

        Ok(notes)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_repository(repository: &str) -> Result<()> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::missing("repository")),
    }
}
