//! Shared HTTP client construction for the routing and geocoding providers

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::debug;

use crate::{DrivoError, Result};

pub const USER_AGENT: &str = concat!("Drivo/", env!("CARGO_PKG_VERSION"));

/// Build a client with a per-request timeout.
///
/// Retries are off unless `max_retries > 0`; the core itself never retries,
/// so enabling them is a deliberate caller policy.
pub fn build_client(timeout: Duration, max_retries: u32, user_agent: &str) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| DrivoError::config(format!("Failed to create HTTP client: {e}")))?;

    let mut builder = ClientBuilder::new(client);
    if max_retries > 0 {
        debug!("Enabling transient-error retries (max {})", max_retries);
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }
    Ok(builder.build())
}

/// Map a transport failure to the provider error the core reports
pub fn transport_error(provider: &str, err: &reqwest_middleware::Error) -> DrivoError {
    DrivoError::provider_unavailable(format!("{provider} request failed: {err}"))
}
