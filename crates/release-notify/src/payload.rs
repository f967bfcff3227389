//! Slack Block Kit message for a release announcement.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ReleaseInfo;
use crate::notes::ReleaseNotes;
use crate::{Error, Result};

/// Slack rejects header blocks longer than this.
pub const HEADER_MAX_CHARS: usize = 150;

/// A Block Kit document.
///
/// `text` is the plain fallback shown in notifications, `blocks` is the
/// rendered layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    pub blocks: Vec<Value>,
}

impl Payload {
    /// Compose the announcement for `info` with `notes` as body.
    ///
    /// Layout: header, repository/actor/package/tag fields, divider, notes,
    /// and a single "View release" button.
    pub fn build(info: &ReleaseInfo, notes: &ReleaseNotes) -> Result<Self> {
        let header_emoji = required("header_emoji", &info.header_emoji)?;
        let board_name = required("board_name", &info.board_name)?;
        let package_name = required("package_name", &info.package_name)?;
        let tag = required("tag", &info.tag)?;
        let repository = required("repository", &info.repository)?;
        let actor = required("actor", &info.actor)?;
        required("server_url", &info.server_url)?;
        // Notes go in as stored; only a blank body is rejected.
        required("notes", notes.text())?;
        let notes_text = notes.text();

        let app_name = info
            .app_name
            .as_deref()
            .map(str::trim)
            .filter(|app| !app.is_empty());

        let title = match app_name {
            Some(app) => format!("{} {} {}", header_emoji, board_name, app),
            None => format!("{} {}", header_emoji, board_name),
        };
        let header = compose_header(&title, tag);

        let release_url = info.release_url();
        let repository_url = format!(
            "{}/{}",
            info.server_url.trim().trim_end_matches('/'),
            repository
        );

        let blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": header,
                    "emoji": true
                }
            }),
            json!({
                "type": "section",
                "fields": [
                    {
                        "type": "mrkdwn",
                        "text": format!("*Repository:*\n<{}|{}>", repository_url, repository)
                    },
                    {
                        "type": "mrkdwn",
                        "text": format!("*Actor:*\n{}", actor)
                    },
                    {
                        "type": "mrkdwn",
                        "text": format!("*Package:*\n{}", package_name)
                    },
                    {
                        "type": "mrkdwn",
                        "text": format!("*Tag:*\n`{}`", tag)
                    }
                ]
            }),
            json!({ "type": "divider" }),
            json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": notes_text
                }
            }),
            json!({
                "type": "actions",
                "elements": [
                    {
                        "type": "button",
                        "action_id": "view_release",
                        "style": "primary",
                        "text": {
                            "type": "plain_text",
                            "text": "View release",
                            "emoji": true
                        },
                        "url": release_url
                    }
                ]
            }),
        ];

        let text = format!("{} {} released by {}", board_name, tag, actor);
        debug!(blocks = blocks.len(), "Built Slack payload");

        Ok(Self { text, blocks })
    }

    /// The header block's text.
    pub fn header_text(&self) -> Option<&str> {
        self.blocks
            .iter()
            .find(|block| block["type"] == "header")
            .and_then(|block| block["text"]["text"].as_str())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Persist the payload as JSON, for inspection by later CI steps.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.to_json_pretty()?).await?;
        debug!(path = %path.display(), "Wrote Slack payload");
        Ok(())
    }
}

fn required<'a>(key: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::missing(key))
    } else {
        Ok(value)
    }
}

/// `"{title} {tag} released"` within [`HEADER_MAX_CHARS`], shortening the
/// title first so the tag stays readable.
fn compose_header(title: &str, tag: &str) -> String {
    let suffix = format!(" {} released", tag);
    let room = HEADER_MAX_CHARS.saturating_sub(suffix.chars().count());
    if room == 0 {
        return clamp_chars(&format!("{}{}", title, suffix), HEADER_MAX_CHARS);
    }
    format!("{}{}", clamp_chars(title, room), suffix)
}

fn clamp_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max.saturating_sub(1)) {
        Some((cut, _)) if text.chars().count() > max => format!("{}…", &text[..cut]),
        _ => text.to_string(),
    }
}
