//! The notification pipeline.
//!
//! Stages run strictly in order: validate, fetch notes, build payload,
//! deliver. The first error moves the notifier to [`Stage::Failed`] and is
//! returned to the caller.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::Result;
use crate::config::{HttpConfig, NotesConfig, NotificationConfig, ReleaseInfo};
use crate::notes::{NotesFetcher, ReleaseNotes};
use crate::outputs::{self, OutputSink, StepOutputs};
use crate::payload::Payload;
use crate::transport::{Deliver, DeliveryResult, Transport};
use crate::utils::http_client;

/// Pipeline progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validated,
    NotesFetched,
    PayloadBuilt,
    Delivered,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validated => "validated",
            Self::NotesFetched => "notes_fetched",
            Self::PayloadBuilt => "payload_built",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Knobs that do not change the message itself.
#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Also persist the payload JSON here.
    pub payload_file: Option<PathBuf>,
    pub output: OutputSink,
    /// Build everything but skip delivery.
    pub dry_run: bool,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            payload_file: None,
            output: OutputSink::Stdout,
            dry_run: false,
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub release_url: String,
    pub notes: ReleaseNotes,
    pub payload: Payload,
    /// `None` on a dry run.
    pub delivery: Option<DeliveryResult>,
    pub outputs: StepOutputs,
}

/// Drives one release announcement from validated config to delivery.
pub struct Notifier {
    config: NotificationConfig,
    info: ReleaseInfo,
    fetcher: NotesFetcher,
    transport: Transport,
    options: NotifierOptions,
    stage: Stage,
}

impl Notifier {
    pub fn new(
        config: NotificationConfig,
        info: ReleaseInfo,
        notes: NotesConfig,
        http: &HttpConfig,
        options: NotifierOptions,
    ) -> Result<Self> {
        let client = http_client::build_client(http)?;
        let transport = Transport::from_config(&config, client.clone());

        Ok(Self {
            config,
            info,
            fetcher: NotesFetcher::new(client, notes),
            transport,
            options,
            stage: Stage::Idle,
        })
    }

    /// Replace the transport built from the config.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }

    /// Run all stages once.
    pub async fn run(&mut self) -> Result<Report> {
        match self.run_stages().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(stage = %self.stage, error = %e, "Release notification failed");
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<Report> {
        if self.stage != Stage::Idle {
            return Err(crate::Error::config(format!(
                "notifier already ran (stage: {})",
                self.stage
            )));
        }

        info!(
            method = %self.config.method(),
            repository = %self.info.repository,
            tag = %self.info.tag,
            "Announcing release"
        );
        self.advance(Stage::Validated);

        let notes = self
            .fetcher
            .fetch(&self.info.repository, &self.info.tag)
            .await?;
        self.advance(Stage::NotesFetched);

        let payload = Payload::build(&self.info, &notes)?;
        let release_url = self.info.release_url();
        if let Some(path) = &self.options.payload_file {
            payload.write_to(path).await?;
        }
        self.advance(Stage::PayloadBuilt);

        let mut step_outputs = StepOutputs::new();
        step_outputs.set(outputs::RELEASE_URL, release_url.as_str());
        step_outputs.set(outputs::NOTES_ESCAPED, notes.escaped());
        step_outputs.write(&self.options.output).await?;

        if self.options.dry_run {
            info!(release_url = %release_url, "Dry run, skipping delivery");
            return Ok(Report {
                release_url,
                notes,
                payload,
                delivery: None,
                outputs: step_outputs,
            });
        }

        let delivery = self.transport.deliver(&payload).await?;
        if let Some(ts) = &delivery.server_message_id {
            let mut ts_output = StepOutputs::new();
            ts_output.set(outputs::SLACK_TS, ts.as_str());
            ts_output.write(&self.options.output).await?;
            step_outputs.set(outputs::SLACK_TS, ts.as_str());
        }
        self.advance(Stage::Delivered);

        info!(
            transport = self.transport.transport_type(),
            release_url = %release_url,
            "Release notification delivered"
        );

        Ok(Report {
            release_url,
            notes,
            payload,
            delivery: Some(delivery),
            outputs: step_outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_terminal() {
        assert!(Stage::Delivered.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::PayloadBuilt.is_terminal());
        assert_eq!(Stage::NotesFetched.to_string(), "notes_fetched");
    }
}
