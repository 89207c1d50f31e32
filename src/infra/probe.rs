//! External health probe over HTTP.
//!
//! Some deployments carry a companion process outside the managed stack
//! (e.g. a host-side printer utility) whose health should gate the
//! aggregate health answer. When a probe URL is configured, the endpoint
//! is queried on every health request; a non-2xx answer, a transport
//! error, or an unexpected `status` body field all count as a failed
//! probe.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::application::ports::ServiceProbe;
use crate::domain::health::ProbeResult;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpServiceProbe {
    client: reqwest::Client,
    url: Option<String>,
    name: String,
    expect: Option<String>,
}

impl HttpServiceProbe {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: Option<String>, name: String, expect: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("building probe HTTP client")?;
        Ok(Self {
            client,
            url,
            name,
            expect,
        })
    }

    async fn check(&self, url: &str) -> bool {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%err, %url, "probe request failed");
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }

        match &self.expect {
            None => true,
            // The endpoint must report the expected `status` field.
            Some(expected) => response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("status")
                        .and_then(|s| s.as_str())
                        .map(|s| s == expected)
                })
                .unwrap_or(false),
        }
    }
}

impl ServiceProbe for HttpServiceProbe {
    async fn probe(&self) -> Option<ProbeResult> {
        let url = self.url.as_ref()?;
        let healthy = self.check(url).await;
        Some(ProbeResult {
            name: self.name.clone(),
            healthy,
        })
    }
}
