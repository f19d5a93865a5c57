//! Webhook results relay.
//!
//! POSTs the final poll summary as Discord-webhook JSON to a configured URL.
//! Delivery is fire-and-forget: the request runs on a detached task and its
//! outcome is only logged, so closing a poll never waits on the network.

use tracing::{info, warn};

/// Best-effort delivery of a results summary.
pub trait ResultsRelay: Send + Sync {
    /// Hand off the summary. Returns immediately; delivery happens later.
    fn deliver(&self, summary: &str);
}

/// Relay that POSTs `{"content": <summary>}` to a webhook URL.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    url: String,
}

impl WebhookRelay {
    /// Create a relay targeting the given webhook URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Body shape expected by Discord-compatible webhooks.
    fn payload(summary: &str) -> serde_json::Value {
        serde_json::json!({ "content": summary })
    }
}

impl ResultsRelay for WebhookRelay {
    fn deliver(&self, summary: &str) {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = Self::payload(summary);

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("poll results relayed to webhook");
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "webhook rejected poll results");
                }
                Err(e) => {
                    warn!(error = %e, "failed to relay poll results");
                }
            }
        });
    }
}
