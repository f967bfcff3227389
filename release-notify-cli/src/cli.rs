use std::path::PathBuf;

use clap::Parser;

/// Announce a published release to Slack.
///
/// Every flag falls back to an environment variable so the tool can be
/// dropped into a CI step as-is.
#[derive(Parser, Debug, Default)]
#[command(name = "release-notify", version, about, long_about = None)]
pub struct Args {
    /// Delivery method: "bot" or "webhook"
    #[arg(long, env = "SLACK_METHOD")]
    pub method: Option<String>,

    /// Slack channel id (bot method)
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Slack bot token (bot method)
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Slack incoming webhook URL (webhook method)
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Emoji shown at the start of the header
    #[arg(long, env = "HEADER_EMOJI")]
    pub header_emoji: Option<String>,

    /// Board or product name
    #[arg(long, env = "BOARD_NAME")]
    pub board_name: Option<String>,

    /// Application name, shown in the header when set
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Released package name
    #[arg(long, env = "PACKAGE_NAME")]
    pub package_name: Option<String>,

    /// Release tag
    #[arg(long, env = "RELEASE_TAG")]
    pub tag: Option<String>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// User that triggered the release
    #[arg(long, env = "GITHUB_ACTOR")]
    pub actor: Option<String>,

    /// Commit the release notes are generated up to
    #[arg(long, env = "TARGET_COMMIT")]
    pub target_commit: Option<String>,

    /// Previous tag the release notes start from
    #[arg(long, env = "PREVIOUS_TAG")]
    pub previous_tag: Option<String>,

    /// Maximum release notes length in characters
    #[arg(long, env = "MAX_NOTES_LENGTH")]
    pub max_notes_length: Option<usize>,

    /// Text used when no release notes are generated
    #[arg(long, env = "NOTES_FALLBACK")]
    pub notes_fallback: Option<String>,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub web URL used for release links
    #[arg(long, env = "GITHUB_SERVER_URL")]
    pub server_url: Option<String>,

    /// GitHub REST API URL
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// File step outputs are appended to (stdout when unset)
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,

    /// Also write the Slack payload JSON to this file
    #[arg(long, env = "SLACK_PAYLOAD_FILE")]
    pub payload_file: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "RELEASE_NOTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Build the payload and print it instead of delivering
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Args::try_parse_from(["release-notify", "--verbose", "--quiet"]);
        assert!(result.is_err());
    }
}
