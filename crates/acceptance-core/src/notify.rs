//! Settlement receipt delivery.
//!
//! Sinks are fire-and-forget: they return nothing, must not block the caller,
//! and handle their own failures.

use std::time::Duration;

use serde::Serialize;

use crate::hmac::sign_payload;

pub trait NotificationSink: Send + Sync {
    fn notify_receipt(&self, intent_id: &str, message: &str);
}

/// Writes receipts to the log. Stands in for the POS push channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify_receipt(&self, intent_id: &str, message: &str) {
        tracing::info!(intent_id = %intent_id, message = %message, "receipt pushed to POS");
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptWebhook {
    pub event: String,
    pub payment_intent_id: String,
    pub message: String,
    pub timestamp: u64,
}

/// POSTs a [`ReceiptWebhook`] to every configured URL on a background task.
pub struct WebhookNotifier {
    client: reqwest::Client,
    urls: Vec<String>,
    hmac_key: Option<Vec<u8>>,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, urls: Vec<String>) -> Self {
        Self {
            client,
            urls,
            hmac_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Sign every payload with `X-Receipt-Signature`.
    pub fn with_hmac_key(mut self, key: Vec<u8>) -> Self {
        self.hmac_key = Some(key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Warn about receipt URLs that would send payloads in cleartext. Call at startup.
pub fn validate_webhook_urls(urls: &[String]) {
    for url in urls {
        if !url.starts_with("https://") {
            tracing::warn!(
                url = %url,
                "receipt webhook URL does not use HTTPS; payloads will be sent in cleartext"
            );
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl NotificationSink for WebhookNotifier {
    fn notify_receipt(&self, intent_id: &str, message: &str) {
        if self.urls.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(intent_id = %intent_id, "no async runtime, receipt webhook dropped");
            return;
        };

        let webhook = ReceiptWebhook {
            event: "settlement.receipt".to_string(),
            payment_intent_id: intent_id.to_string(),
            message: message.to_string(),
            timestamp: unix_now(),
        };
        let body = match serde_json::to_vec(&webhook) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize receipt webhook");
                return;
            }
        };
        let signature = self.hmac_key.as_deref().map(|key| sign_payload(key, &body));

        for url in &self.urls {
            let mut request = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .timeout(self.timeout);
            if let Some(sig) = &signature {
                request = request.header("X-Receipt-Signature", sig.as_str());
            }
            let request = request.body(body.clone());
            let url = url.clone();

            runtime.spawn(async move {
                match request.send().await {
                    Ok(resp) if resp.status().is_success() => {
                        tracing::debug!(url = %url, status = %resp.status(), "receipt webhook delivered")
                    }
                    Ok(resp) => {
                        tracing::warn!(url = %url, status = %resp.status(), "receipt webhook rejected")
                    }
                    Err(e) => tracing::warn!(url = %url, error = %e, "receipt webhook delivery failed"),
                }
            });
        }
    }
}
