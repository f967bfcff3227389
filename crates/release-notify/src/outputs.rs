//! Step outputs handed to later CI steps.
//!
//! Values are appended to the `GITHUB_OUTPUT` file, multiline values using the
//! `name<<DELIMITER` heredoc form.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::Result;

pub const RELEASE_URL: &str = "release_url";
pub const NOTES_ESCAPED: &str = "notes_escaped";
pub const SLACK_TS: &str = "slack_ts";

/// Where step outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Append to the CI output file.
    File(PathBuf),
    /// Print to stdout.
    Stdout,
}

/// Ordered set of named outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutputs {
    entries: Vec<(String, String)>,
}

impl StepOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in the `GITHUB_OUTPUT` file format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            if value.contains('\n') || value.contains('\r') {
                let delimiter = delimiter_for(value);
                out.push_str(&format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter));
            } else {
                out.push_str(&format!("{}={}\n", name, value));
            }
        }
        out
    }

    pub async fn write(&self, sink: &OutputSink) -> Result<()> {
        let rendered = self.render();
        match sink {
            OutputSink::File(path) => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(rendered.as_bytes()).await?;
                file.flush().await?;
                debug!(path = %path.display(), outputs = self.entries.len(), "Wrote step outputs");
            }
            OutputSink::Stdout => print!("{}", rendered),
        }
        Ok(())
    }
}

fn delimiter_for(value: &str) -> String {
    loop {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        if !value.contains(&delimiter) {
            return delimiter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_line() {
        let mut outputs = StepOutputs::new();
        outputs.set(RELEASE_URL, "https://github.com/org/repo/releases/tag/v1");
        outputs.set(SLACK_TS, "1700000000.000100");

        assert_eq!(
            outputs.render(),
            "release_url=https://github.com/org/repo/releases/tag/v1\nslack_ts=1700000000.000100\n"
        );
    }

    #[test]
    fn test_render_multiline_uses_heredoc() {
        let mut outputs = StepOutputs::new();
        outputs.set("body", "line one\nline two");

        let rendered = outputs.render();
        let mut lines = rendered.lines();
        let header = lines.next().unwrap();
        let (name, delimiter) = header.split_once("<<").unwrap();
        assert_eq!(name, "body");
        assert_eq!(lines.next(), Some("line one"));
        assert_eq!(lines.next(), Some("line two"));
        assert_eq!(lines.next(), Some(delimiter));
    }

    #[test]
    fn test_set_replaces_value() {
        let mut outputs = StepOutputs::new();
        outputs.set(SLACK_TS, "1");
        outputs.set(SLACK_TS, "2");
        assert_eq!(outputs.get(SLACK_TS), Some("2"));
        assert_eq!(outputs.render(), "slack_ts=2\n");
    }

    #[tokio::test]
    async fn test_write_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let mut outputs = StepOutputs::new();
        outputs.set(NOTES_ESCAPED, "a\\nb");
        outputs.write(&OutputSink::File(path.clone())).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing=1\nnotes_escaped=a\\nb\n");
    }
}
