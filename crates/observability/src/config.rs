use std::env;
use url::Url;

#[derive(Clone)]
pub(crate) struct ServiceContext {
    pub(crate) name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

pub(crate) struct ObservabilityConfig {
    pub(crate) service: ServiceContext,
    pub(crate) discord_webhook: Option<Url>,
    /// Parse problems, logged once tracing is up instead of silently eaten.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();
        let name = non_empty_env("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = non_empty_env("STAGE").unwrap_or_else(|| "unknown".to_string());

        let mut warnings = Vec::new();
        let enabled = env::var("DISCORD_NOTIFY_ENABLED")
            .ok()
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(true);

        let discord_webhook = if !enabled {
            None
        } else {
            match non_empty_env("DISCORD_WEBHOOK_URL") {
                None => None,
                Some(raw) => match Url::parse(&raw) {
                    Ok(url) => Some(url),
                    Err(err) => {
                        // Webhook URLs embed a secret; never echo the value.
                        warnings.push(format!(
                            "DISCORD_WEBHOOK_URL is set but unparseable; notifications disabled ({err})"
                        ));
                        None
                    }
                },
            }
        };

        Self {
            service: ServiceContext {
                name,
                environment,
                component,
            },
            discord_webhook,
            warnings,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
