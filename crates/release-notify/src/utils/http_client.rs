use std::sync::OnceLock;

use reqwest::Client;
use tracing::debug;

use crate::Result;
use crate::config::HttpConfig;

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the HTTP client shared by the notes fetcher and the transports.
///
/// Without an explicit timeout the reqwest default applies.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    install_rustls_provider();

    let mut builder = Client::builder().user_agent(config.user_agent.as_str());
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
pub(crate) fn test_client() -> Client {
    build_client(&HttpConfig::default()).unwrap()
}
