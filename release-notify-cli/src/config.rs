//! Settings assembly: flags and environment over an optional TOML file over
//! built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use release_notify::config::{BOT_TOKEN, CHANNEL_ID, WEBHOOK_URL};
use release_notify::{
    Error, HttpConfig, NotesConfig, NotificationConfig, NotifierOptions, OutputSink, ReleaseInfo,
    Result,
};
use serde::Deserialize;
use tracing::debug;

use crate::cli::Args;

/// Values that may live in the TOML config file.
///
/// Secrets are accepted here too, but are better passed through the
/// environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub method: Option<String>,
    pub channel_id: Option<String>,
    pub bot_token: Option<String>,
    pub webhook_url: Option<String>,
    pub header_emoji: Option<String>,
    pub board_name: Option<String>,
    pub app_name: Option<String>,
    pub package_name: Option<String>,
    pub max_notes_length: Option<usize>,
    pub notes_fallback: Option<String>,
    pub server_url: Option<String>,
    pub api_url: Option<String>,
    pub payload_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load the config file, or an empty config when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fully resolved inputs for one notifier run.
#[derive(Debug)]
pub struct Settings {
    pub notification: NotificationConfig,
    pub info: ReleaseInfo,
    pub notes: NotesConfig,
    pub http: HttpConfig,
    pub options: NotifierOptions,
}

impl Settings {
    pub fn resolve(args: &Args, file: FileConfig) -> Result<Self> {
        let method = pick(&args.method, &file.method).ok_or_else(|| Error::missing("method"))?;

        let mut credentials = HashMap::new();
        for (key, flag, from_file) in [
            (CHANNEL_ID, &args.channel_id, &file.channel_id),
            (BOT_TOKEN, &args.bot_token, &file.bot_token),
            (WEBHOOK_URL, &args.webhook_url, &file.webhook_url),
        ] {
            if let Some(value) = pick(flag, from_file) {
                credentials.insert(key.to_string(), value);
            }
        }
        let notification = NotificationConfig::from_values(&method, &credentials)?;

        let defaults = ReleaseInfo::default();
        let info = ReleaseInfo {
            header_emoji: pick(&args.header_emoji, &file.header_emoji)
                .unwrap_or(defaults.header_emoji),
            board_name: pick(&args.board_name, &file.board_name).unwrap_or_default(),
            app_name: pick(&args.app_name, &file.app_name),
            package_name: pick(&args.package_name, &file.package_name).unwrap_or_default(),
            tag: pick(&args.tag, &None).unwrap_or_default(),
            repository: pick(&args.repository, &None).unwrap_or_default(),
            actor: pick(&args.actor, &None).unwrap_or_default(),
            server_url: pick(&args.server_url, &file.server_url).unwrap_or(defaults.server_url),
        };

        let notes_defaults = NotesConfig::default();
        let max_length = args
            .max_notes_length
            .or(file.max_notes_length)
            .unwrap_or(notes_defaults.max_length);
        if max_length == 0 {
            return Err(Error::config("max_notes_length must be greater than zero"));
        }
        let notes = NotesConfig {
            api_url: pick(&args.api_url, &file.api_url).unwrap_or(notes_defaults.api_url),
            token: pick(&args.github_token, &None),
            max_length,
            // Fallback text is used verbatim, so only an unset value falls back.
            fallback: args
                .notes_fallback
                .clone()
                .or_else(|| file.notes_fallback.clone())
                .unwrap_or(notes_defaults.fallback),
            target_commit: pick(&args.target_commit, &None),
            previous_tag: pick(&args.previous_tag, &None),
        };

        let http = HttpConfig {
            timeout: args
                .timeout
                .or(file.timeout_secs)
                .map(Duration::from_secs),
            ..Default::default()
        };

        let options = NotifierOptions {
            payload_file: args.payload_file.clone().or(file.payload_file),
            output: match &args.output_file {
                Some(path) if !path.as_os_str().is_empty() => OutputSink::File(path.clone()),
                _ => OutputSink::Stdout,
            },
            dry_run: args.dry_run,
        };

        Ok(Self {
            notification,
            info,
            notes,
            http,
            options,
        })
    }
}

/// First non-blank value, flag before file.
fn pick(flag: &Option<String>, from_file: &Option<String>) -> Option<String> {
    [flag, from_file]
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use release_notify::DeliveryMethod;

    use super::*;

    fn bot_args() -> Args {
        Args {
            method: Some("bot".to_string()),
            channel_id: Some("C123".to_string()),
            bot_token: Some("xoxb-1".to_string()),
            board_name: Some("BCU".to_string()),
            package_name: Some("bcu-firmware".to_string()),
            tag: Some("v1.2.3".to_string()),
            repository: Some("org/repo".to_string()),
            actor: Some("octocat".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Settings::resolve(&bot_args(), FileConfig::default()).unwrap();

        assert_eq!(settings.notification.method(), DeliveryMethod::Bot);
        assert_eq!(settings.info.header_emoji, ":rocket:");
        assert_eq!(settings.info.server_url, "https://github.com");
        assert_eq!(settings.notes.max_length, 2900);
        assert_eq!(settings.notes.api_url, "https://api.github.com");
        assert_eq!(settings.options.output, OutputSink::Stdout);
        assert!(settings.http.timeout.is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig::parse(
            r#"
            board_name = "AVAS"
            app_name = "Bootloader"
            max_notes_length = 100
            timeout_secs = 10
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(&bot_args(), file).unwrap();

        assert_eq!(settings.info.board_name, "BCU");
        assert_eq!(settings.info.app_name.as_deref(), Some("Bootloader"));
        assert_eq!(settings.notes.max_length, 100);
        assert_eq!(settings.http.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_method_from_file() {
        let args = Args {
            method: None,
            webhook_url: Some("https://hooks.slack.com/services/T/B/x".to_string()),
            ..bot_args()
        };
        let file = FileConfig::parse(r#"method = "webhook""#).unwrap();

        let settings = Settings::resolve(&args, file).unwrap();
        assert_eq!(settings.notification.method(), DeliveryMethod::Webhook);
    }

    #[test]
    fn test_missing_method() {
        let args = Args {
            method: Some("  ".to_string()),
            ..bot_args()
        };
        let err = Settings::resolve(&args, FileConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration(ref k) if k == "method"));
    }

    #[test]
    fn test_missing_bot_token() {
        let args = Args {
            bot_token: None,
            ..bot_args()
        };
        let err = Settings::resolve(&args, FileConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingConfiguration(ref k) if k == BOT_TOKEN));
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let args = Args {
            max_notes_length: Some(0),
            ..bot_args()
        };
        let err = Settings::resolve(&args, FileConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        assert!(FileConfig::parse("chanel_id = \"C1\"").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release-notify.toml");
        std::fs::write(&path, "header_emoji = \":tada:\"\n").unwrap();

        let file = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(file.header_emoji.as_deref(), Some(":tada:"));

        let err = FileConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
