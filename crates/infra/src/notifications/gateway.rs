use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;

use domain::{
    entities::invoices::InvoiceEntity,
    repositories::notification_client::NotificationClient,
    value_objects::enums::{reminder_channels::ReminderChannel, reminder_stages::ReminderStage},
};

use crate::http_errors::{error_for_status, map_transport_error};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct NotificationGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    /// Shared secret for the X-Signature header the gateway verifies.
    pub signing_secret: String,
    pub timeout_secs: u64,
}

/// Client for the in-house messaging gateway. The gateway owns recipient
/// resolution and templates; this side only names the invoice, stage and
/// channel, signed so the gateway can reject forged requests.
pub struct NotificationGatewayClient {
    client: reqwest::Client,
    config: NotificationGatewayConfig,
}

impl NotificationGatewayClient {
    pub fn new(config: NotificationGatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build notification gateway HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationClient for NotificationGatewayClient {
    async fn send(
        &self,
        channel: ReminderChannel,
        invoice: &InvoiceEntity,
        stage: ReminderStage,
    ) -> Result<()> {
        let body = json!({
            "channel": channel.as_str(),
            "stage": stage.as_str(),
            "invoice_id": invoice.id,
            "invoice_number": invoice.invoice_number,
            "amount_minor": invoice.amount_minor,
            "due_date": invoice.due_date,
        });
        let payload = serde_json::to_vec(&body).context("failed to encode reminder payload")?;
        let signature = sign_payload(&self.config.signing_secret, &payload);

        let url = format!(
            "{}/v1/messages",
            self.config.base_url.trim_end_matches('/')
        );
        let context = "notification gateway";

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Signature", signature)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| map_transport_error(err, context))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(status, context));
        }

        debug!(
            invoice_id = %invoice.id,
            channel = %channel,
            stage = %stage,
            "notification_gateway: reminder dispatched"
        );
        Ok(())
    }
}

fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_per_secret_and_payload() {
        let payload = br#"{"invoice_id":"x"}"#;

        let first = sign_payload("secret-a", payload);
        let second = sign_payload("secret-a", payload);
        assert_eq!(first, second);
        // Hex-encoded SHA-256 MAC.
        assert_eq!(first.len(), 64);

        assert_ne!(first, sign_payload("secret-b", payload));
        assert_ne!(first, sign_payload("secret-a", br#"{"invoice_id":"y"}"#));
    }
}
