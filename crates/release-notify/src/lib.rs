//! Announce a published release to Slack.
//!
//! The pipeline validates the delivery configuration, fetches generated
//! release notes from GitHub, renders a Block Kit message and posts it
//! through a bot token or an incoming webhook. See [`Notifier`].

pub mod config;
pub mod error;
pub mod notes;
pub mod notifier;
pub mod outputs;
pub mod payload;
pub mod transport;
pub mod utils;

pub use config::{
    Credentials, DeliveryMethod, HttpConfig, NotesConfig, NotificationConfig, ReleaseInfo,
};
pub use error::{Error, Result};
pub use notes::{NotesFetcher, ReleaseNotes, TRUNCATION_MARKER};
pub use notifier::{Notifier, NotifierOptions, Report, Stage};
pub use outputs::{OutputSink, StepOutputs};
pub use payload::Payload;
pub use transport::{BotTransport, Deliver, DeliveryResult, Transport, WebhookTransport};
