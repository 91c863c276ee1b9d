mod config;
mod discord;
mod layer;
mod notifier;

use anyhow::Result;
use config::ObservabilityConfig;
use discord::DiscordWebhookProvider;
use layer::ErrorNotifyLayer;
use notifier::Notifier;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global tracing subscriber: RUST_LOG-driven filtering with an
/// `info` default, local-time RFC3339 output, and an optional Discord sink
/// that forwards error events to the on-call channel.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let notify_layer = config.discord_webhook.clone().map(|webhook_url| {
        let notifier = Notifier::new(vec![Arc::new(DiscordWebhookProvider::new(webhook_url))]);
        ErrorNotifyLayer::new(notifier, config.service.clone()).with_filter(
            tracing_subscriber::filter::LevelFilter::from_level(tracing::Level::ERROR),
        )
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(notify_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &config.warnings {
        warn!(
            service = %config.service.name,
            component = %config.service.component,
            warning = %warning,
            "Observability config warning"
        );
    }

    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        component = %config.service.component,
        discord_notifications = config.discord_webhook.is_some(),
        "Observability initialized"
    );

    Ok(())
}
