mod cli;
mod config;

use std::process;

use clap::Parser;
use release_notify::{Notifier, Result};
use tracing::error;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

use crate::{
    cli::Args,
    config::{FileConfig, Settings},
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env before parsing so clap's env fallbacks can see it.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(args.verbose, args.quiet, args.json_logs);

    let result = run(args).await;
    if let Err(e) = &result {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
    }

    let code = exit_code(&result);
    if code != 0 {
        process::exit(code);
    }
}

/// Any failure, whichever stage it came from, exits with 1.
fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

async fn run(args: Args) -> Result<()> {
    let file = FileConfig::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file)?;
    let dry_run = settings.options.dry_run;

    let mut notifier = Notifier::new(
        settings.notification,
        settings.info,
        settings.notes,
        &settings.http,
        settings.options,
    )?;
    let report = notifier.run().await?;

    if dry_run {
        println!("{}", report.payload.to_json_pretty()?);
    }

    Ok(())
}

fn build_filter(verbose: bool, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        // `info` applies only when RUST_LOG names no level of its own.
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse_lossy(rust_log.unwrap_or_default())
    }
}

fn init_logging(verbose: bool, quiet: bool, json: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbose, quiet, rust_log.as_deref());

    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries step outputs and the dry-run payload.
    if json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(verbose)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use release_notify::Error;

    use super::*;

    #[test]
    fn test_filter_defaults_to_info() {
        let filter = build_filter(false, false, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_filter_keeps_rust_log_level() {
        let filter = build_filter(false, false, Some("warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(false, false, Some("error"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_filter_flags_win_over_rust_log() {
        let filter = build_filter(false, true, Some("debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));

        let filter = build_filter(true, false, Some("warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[tokio::test]
    async fn test_missing_method_exits_nonzero() {
        let result = run(Args::default()).await;

        assert!(matches!(result, Err(Error::MissingConfiguration(ref k)) if k == "method"));
        assert_eq!(exit_code(&result), 1);
    }

    #[tokio::test]
    async fn test_unknown_method_exits_nonzero() {
        let args = Args {
            method: Some("email".to_string()),
            ..Default::default()
        };
        let result = run(args).await;

        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "email"));
        assert_eq!(exit_code(&result), 1);
    }

    #[test]
    fn test_success_exits_zero() {
        assert_eq!(exit_code(&Ok(())), 0);
    }
}
