//! Configuration consumed by the pipeline stages.
//!
//! Every stage receives an explicit, already-validated config struct; nothing
//! below reads the process environment.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Credential key for the Slack channel id (bot transport).
pub const CHANNEL_ID: &str = "channel_id";
/// Credential key for the Slack bot token (bot transport).
pub const BOT_TOKEN: &str = "bot_token";
/// Credential key for the incoming webhook URL (webhook transport).
pub const WEBHOOK_URL: &str = "webhook_url";

/// Default maximum length of the release notes, in characters.
///
/// Slack rejects section text above 3000 characters, the rest is headroom
/// for the truncation marker.
pub const DEFAULT_MAX_NOTES_LENGTH: usize = 2900;

/// Text used when the host returns no release notes.
pub const DEFAULT_NOTES_FALLBACK: &str = "No release notes provided.";

pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_HEADER_EMOJI: &str = ":rocket:";

/// How the message is handed to Slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    /// `chat.postMessage` authenticated with a bot token.
    Bot,
    /// Incoming webhook URL.
    Webhook,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Webhook => "webhook",
        }
    }

    /// Credential keys this method cannot work without.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Bot => &[CHANNEL_ID, BOT_TOKEN],
            Self::Webhook => &[WEBHOOK_URL],
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bot" => Ok(Self::Bot),
            "webhook" => Ok(Self::Webhook),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential set for one delivery method.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bot { channel_id: String, bot_token: String },
    Webhook { url: String },
}

impl Credentials {
    pub fn method(&self) -> DeliveryMethod {
        match self {
            Self::Bot { .. } => DeliveryMethod::Bot,
            Self::Webhook { .. } => DeliveryMethod::Webhook,
        }
    }
}

// Tokens and webhook URLs are secrets; keep them out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bot { channel_id, .. } => f
                .debug_struct("Bot")
                .field("channel_id", channel_id)
                .field("bot_token", &"<redacted>")
                .finish(),
            Self::Webhook { .. } => f
                .debug_struct("Webhook")
                .field("url", &"<redacted>")
                .finish(),
        }
    }
}

/// Validated delivery configuration.
///
/// Holds exactly the credential set `method` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    method: DeliveryMethod,
    credentials: Credentials,
}

impl NotificationConfig {
    /// Build a config, checking that the credentials belong to `method` and are
    /// not blank.
    pub fn new(method: DeliveryMethod, credentials: Credentials) -> Result<Self> {
        if credentials.method() != method {
            return Err(Error::missing(method.required_keys()[0]));
        }

        match &credentials {
            Credentials::Bot {
                channel_id,
                bot_token,
            } => {
                require(CHANNEL_ID, channel_id)?;
                require(BOT_TOKEN, bot_token)?;
            }
            Credentials::Webhook { url } => {
                require(WEBHOOK_URL, url)?;
                Url::parse(url.trim())
                    .map_err(|e| Error::config(format!("invalid {}: {}", WEBHOOK_URL, e)))?;
            }
        }

        Ok(Self {
            method,
            credentials,
        })
    }

    /// Validate a method name against a bag of available credential values.
    ///
    /// Keys the method does not need are ignored. Blank values count as absent.
    pub fn from_values(method: &str, values: &HashMap<String, String>) -> Result<Self> {
        let method: DeliveryMethod = method.parse()?;

        let lookup = |key: &str| -> Result<String> {
            values
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::missing(key))
        };

        let credentials = match method {
            DeliveryMethod::Bot => Credentials::Bot {
                channel_id: lookup(CHANNEL_ID)?,
                bot_token: lookup(BOT_TOKEN)?,
            },
            DeliveryMethod::Webhook => Credentials::Webhook {
                url: lookup(WEBHOOK_URL)?,
            },
        };

        Self::new(method, credentials)
    }

    pub fn method(&self) -> DeliveryMethod {
        self.method
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::missing(key))
    } else {
        Ok(())
    }
}

/// Settings for the release notes fetcher.
#[derive(Clone)]
pub struct NotesConfig {
    /// Base URL of the host REST API.
    pub api_url: String,
    /// Optional API token sent as a bearer credential.
    pub token: Option<String>,
    /// Maximum notes length in characters before truncation.
    pub max_length: usize,
    /// Replacement text when the host returns no notes.
    pub fallback: String,
    /// Commit the notes are generated up to (`target_commitish`).
    pub target_commit: Option<String>,
    /// Tag the notes are generated from (`previous_tag_name`).
    pub previous_tag: Option<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            max_length: DEFAULT_MAX_NOTES_LENGTH,
            fallback: DEFAULT_NOTES_FALLBACK.to_string(),
            target_commit: None,
            previous_tag: None,
        }
    }
}

impl fmt::Debug for NotesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("max_length", &self.max_length)
            .field("fallback", &self.fallback)
            .field("target_commit", &self.target_commit)
            .field("previous_tag", &self.previous_tag)
            .finish()
    }
}

/// Facts about the release being announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub header_emoji: String,
    /// Board or product name shown in the header.
    pub board_name: String,
    pub app_name: Option<String>,
    pub package_name: String,
    pub tag: String,
    /// Repository in `owner/name` form.
    pub repository: String,
    pub actor: String,
    /// Web host the release page lives on, e.g. `https://github.com`.
    pub server_url: String,
}

impl Default for ReleaseInfo {
    fn default() -> Self {
        Self {
            header_emoji: DEFAULT_HEADER_EMOJI.to_string(),
            board_name: String::new(),
            app_name: None,
            package_name: String::new(),
            tag: String::new(),
            repository: String::new(),
            actor: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl ReleaseInfo {
    /// Link to the release page: `<server>/<repository>/releases/tag/<tag>`.
    pub fn release_url(&self) -> String {
        format!(
            "{}/{}/releases/tag/{}",
            self.server_url.trim().trim_end_matches('/'),
            self.repository.trim().trim_matches('/'),
            self.tag.trim()
        )
    }
}

/// HTTP client settings shared by all stages.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout. `None` keeps the client default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("release-notify/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
