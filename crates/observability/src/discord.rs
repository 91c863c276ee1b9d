use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::notifier::{NotificationEvent, NotificationProvider};

const DISCORD_CONTENT_LIMIT: usize = 2000;

pub(crate) struct DiscordWebhookProvider {
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhookProvider {
    pub(crate) fn new(webhook_url: Url) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .expect("reqwest client must build");

        Self {
            webhook_url,
            client,
        }
    }

    fn render(&self, event: &NotificationEvent) -> String {
        let mut lines = vec![
            format!(
                "**{}** `{}` `{}` `{}`",
                event.service,
                event.environment,
                event.component,
                event.level.as_str()
            ),
            format!(
                "`{}` `{}`",
                event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                event.target
            ),
        ];

        if let Some(message) = event.message.as_ref().filter(|m| !m.trim().is_empty()) {
            lines.push(format!("> {}", message.trim()));
        }
        for (key, value) in &event.fields {
            lines.push(format!("- `{key}` = `{value}`"));
        }

        truncate(lines.join("\n"))
    }
}

#[async_trait]
impl NotificationProvider for DiscordWebhookProvider {
    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": self.render(event) }))
            .send()
            .await
            .map_err(|err| {
                // The webhook URL is a secret; reqwest errors may echo it.
                if err.is_timeout() {
                    anyhow!("discord webhook request timed out")
                } else {
                    anyhow!("discord webhook request failed")
                }
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "discord webhook returned non-success status: {}",
                response.status()
            ));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "discord"
    }
}

fn truncate(content: String) -> String {
    const SUFFIX: &str = "\n… (truncated)";
    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }

    let allowed = DISCORD_CONTENT_LIMIT.saturating_sub(SUFFIX.chars().count());
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(SUFFIX);
    truncated
}
