//! WiGLE network detail client.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::outcome::{classify_response, LocationLookup, Outcome};
use crate::config::WIGLE_API_URL;

/// HTTP client for the WiGLE network detail endpoint.
///
/// Stateless apart from the credential: one GET per BSSID, classified into an
/// [`Outcome`]. Quota accounting lives in the governor, not here.
pub struct WigleClient {
    client: Arc<reqwest::Client>,
    api_key: String,
    base_url: String,
}

impl WigleClient {
    /// Creates a client against the production WiGLE endpoint.
    pub fn new(client: Arc<reqwest::Client>, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, WIGLE_API_URL)
    }

    /// Creates a client against an alternate endpoint (local test servers).
    pub fn with_base_url(
        client: Arc<reqwest::Client>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LocationLookup for WigleClient {
    async fn fetch(&self, bssid: &str) -> Outcome {
        let response = self
            .client
            .get(&self.base_url)
            .header("Authorization", format!("Basic {}", self.api_key))
            .query(&[("netid", bssid)])
            .send()
            .await;

        // No status line means no confirmed upstream work; anything after the
        // status arrived spent quota even if the body never made it.
        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Outcome::transient_network(format!("request timed out: {e}"));
            }
            Err(e) => {
                return Outcome::transient_network(format!("request failed: {e}"));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::transient_response(format!("body read failed: {e}")),
        };

        debug!("WiGLE lookup for {bssid}: HTTP {status}");
        classify_response(status, &body)
    }
}
