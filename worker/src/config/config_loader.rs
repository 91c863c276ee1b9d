use anyhow::{Context, Result, bail};
use application::retry::RetryPolicy;
use domain::value_objects::enums::reminder_channels::ReminderChannel;
use infra::{
    notifications::gateway::NotificationGatewayConfig, routeros::client::RouterOsConfig,
};

use super::config_model::{
    Database, DotEnvyConfig, RouterHealthConfig, SweepConfig, WorkerServer,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .expect("SERVER_PORT_WORKER is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let sweep = SweepConfig {
        interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("SWEEP_INTERVAL_SECS is invalid")?,
        concurrency: std::env::var("SWEEP_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .context("SWEEP_CONCURRENCY is invalid")?,
        deadline_secs: std::env::var("SWEEP_DEADLINE_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("SWEEP_DEADLINE_SECS is invalid")?,
        channels: parse_channels(
            &std::env::var("REMINDER_CHANNELS").unwrap_or_else(|_| "email".to_string()),
        )?,
        internal_token: std::env::var("INTERNAL_API_TOKEN").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };

    let router_health = RouterHealthConfig {
        interval_secs: std::env::var("ROUTER_HEALTH_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("ROUTER_HEALTH_INTERVAL_SECS is invalid")?,
    };

    let retry = RetryPolicy {
        max_attempts: std::env::var("ACTION_RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("ACTION_RETRY_MAX_ATTEMPTS is invalid")?,
        backoff_base_ms: std::env::var("ACTION_RETRY_BACKOFF_BASE_MS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("ACTION_RETRY_BACKOFF_BASE_MS is invalid")?,
        backoff_max_ms: std::env::var("ACTION_RETRY_BACKOFF_MAX_MS")
            .unwrap_or_else(|_| "15000".to_string())
            .parse()
            .context("ACTION_RETRY_BACKOFF_MAX_MS is invalid")?,
    };

    let router_os = RouterOsConfig {
        use_tls: std::env::var("ROUTEROS_USE_TLS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("ROUTEROS_USE_TLS is invalid")?,
        accept_invalid_certs: std::env::var("ROUTEROS_ACCEPT_INVALID_CERTS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("ROUTEROS_ACCEPT_INVALID_CERTS is invalid")?,
        timeout_secs: std::env::var("ROUTEROS_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("ROUTEROS_TIMEOUT_SECS is invalid")?,
        soft_limit_kbps: std::env::var("ROUTEROS_SOFT_LIMIT_KBPS")
            .unwrap_or_else(|_| "512".to_string())
            .parse()
            .context("ROUTEROS_SOFT_LIMIT_KBPS is invalid")?,
    };

    let notification_gateway = NotificationGatewayConfig {
        base_url: std::env::var("NOTIFY_GATEWAY_URL").expect("NOTIFY_GATEWAY_URL is invalid"),
        api_key: std::env::var("NOTIFY_GATEWAY_API_KEY")
            .expect("NOTIFY_GATEWAY_API_KEY is invalid"),
        signing_secret: std::env::var("NOTIFY_GATEWAY_SIGNING_SECRET")
            .expect("NOTIFY_GATEWAY_SIGNING_SECRET is invalid"),
        timeout_secs: std::env::var("NOTIFY_GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("NOTIFY_GATEWAY_TIMEOUT_SECS is invalid")?,
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        sweep,
        router_health,
        retry,
        router_os,
        notification_gateway,
    })
}

fn parse_channels(raw: &str) -> Result<Vec<ReminderChannel>> {
    let mut channels = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match ReminderChannel::from_str(part) {
            Some(channel) => {
                if !channels.contains(&channel) {
                    channels.push(channel);
                }
            }
            None => bail!("REMINDER_CHANNELS contains unknown channel: {part}"),
        }
    }
    if channels.is_empty() {
        bail!("REMINDER_CHANNELS must name at least one channel");
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_parse_from_csv() {
        let channels = parse_channels("email, whatsapp").unwrap();
        assert_eq!(
            channels,
            vec![ReminderChannel::Email, ReminderChannel::Whatsapp]
        );
    }

    #[test]
    fn duplicate_channels_collapse() {
        let channels = parse_channels("email,email,sms").unwrap();
        assert_eq!(channels, vec![ReminderChannel::Email, ReminderChannel::Sms]);
    }

    #[test]
    fn unknown_and_empty_channel_lists_are_rejected() {
        assert!(parse_channels("email,pager").is_err());
        assert!(parse_channels("").is_err());
    }
}
