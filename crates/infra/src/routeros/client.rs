use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, warn};

use domain::{
    entities::{
        internet_services::InternetServiceEntity,
        provisionings::{NewProvisioningEntity, ProvisioningEntity},
        routers::RouterEntity,
    },
    repositories::router_client::{RouterClient, RouterProbe, SessionPing},
    value_objects::{
        collaborator_errors::CollaboratorError,
        enums::provisioning_statuses::ProvisioningStatus,
    },
};

use crate::http_errors::{error_for_status, map_transport_error};

#[derive(Debug, Clone)]
pub struct RouterOsConfig {
    pub use_tls: bool,
    /// Routers commonly run self-signed certificates on the REST port.
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
    /// Queue rate applied in the soft-limited state, both directions.
    pub soft_limit_kbps: u32,
}

impl Default for RouterOsConfig {
    fn default() -> Self {
        Self {
            use_tls: true,
            accept_invalid_certs: true,
            timeout_secs: 10,
            soft_limit_kbps: 512,
        }
    }
}

/// RouterOS v7 REST client. PPPoE secrets carry the subscription session,
/// simple queues carry the bandwidth; suspend/resume toggles the secret,
/// soft-limit rewrites the queue rate.
pub struct RouterOsClient {
    client: reqwest::Client,
    config: RouterOsConfig,
}

impl RouterOsClient {
    pub fn new(config: RouterOsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("failed to build RouterOS HTTP client")?;

        Ok(Self { client, config })
    }

    fn base_url(&self, router: &RouterEntity) -> String {
        let scheme = if self.config.use_tls { "https" } else { "http" };
        format!("{}://{}:{}/rest", scheme, router.host, router.api_port)
    }

    async fn request(
        &self,
        router: &RouterEntity,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url(router), path);
        let context = format!("routeros {} {}", method, path);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&router.username, Some(&router.password));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| map_transport_error(err, &context))?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(status, &context));
        }

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let value = response
            .json::<Value>()
            .await
            .map_err(|err| map_transport_error(err, &context))?;
        Ok(value)
    }

    /// RouterOS REST addresses items by `.id`; names must be resolved first.
    async fn find_item_id(
        &self,
        router: &RouterEntity,
        collection: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let path = format!("{}?name={}", collection, name);
        let value = self.request(router, Method::GET, &path, None).await?;

        let id = value
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get(".id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(id)
    }

    async fn set_secret_disabled(
        &self,
        router: &RouterEntity,
        pppoe_username: &str,
        disabled: bool,
    ) -> Result<()> {
        let Some(id) = self
            .find_item_id(router, "/ppp/secret", pppoe_username)
            .await?
        else {
            return Err(CollaboratorError::permanent(format!(
                "ppp secret {pppoe_username} not found on {}",
                router.name
            )));
        };

        let disabled = if disabled { "yes" } else { "no" };
        self.request(
            router,
            Method::PATCH,
            &format!("/ppp/secret/{id}"),
            Some(json!({ "disabled": disabled })),
        )
        .await?;
        Ok(())
    }

    async fn set_queue_rate(
        &self,
        router: &RouterEntity,
        queue_name: &str,
        max_limit: &str,
    ) -> Result<()> {
        let Some(id) = self
            .find_item_id(router, "/queue/simple", queue_name)
            .await?
        else {
            return Err(CollaboratorError::permanent(format!(
                "queue {queue_name} not found on {}",
                router.name
            )));
        };

        self.request(
            router,
            Method::PATCH,
            &format!("/queue/simple/{id}"),
            Some(json!({ "max-limit": max_limit })),
        )
        .await?;
        Ok(())
    }

    /// Kicks the live PPPoE session so a disabled secret takes effect now
    /// instead of at the next reconnect. Best effort by design.
    async fn drop_active_session(&self, router: &RouterEntity, pppoe_username: &str) {
        let result = async {
            if let Some(id) = self
                .find_item_id(router, "/ppp/active", pppoe_username)
                .await?
            {
                self.request(router, Method::DELETE, &format!("/ppp/active/{id}"), None)
                    .await?;
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if let Err(err) = result {
            warn!(
                router = %router.name,
                pppoe_username,
                error = %err,
                "routeros: failed to drop active session"
            );
        }
    }

    async fn delete_by_name(
        &self,
        router: &RouterEntity,
        collection: &str,
        name: &str,
    ) -> Result<()> {
        if let Some(id) = self.find_item_id(router, collection, name).await? {
            self.request(router, Method::DELETE, &format!("{collection}/{id}"), None)
                .await?;
        }
        Ok(())
    }

    fn full_rate(&self, policy: &InternetServiceEntity) -> String {
        format_rate(policy.bandwidth_up_kbps, policy.bandwidth_down_kbps)
    }

    fn soft_rate(&self) -> String {
        let kbps = i32::try_from(self.config.soft_limit_kbps).unwrap_or(i32::MAX);
        format_rate(kbps, kbps)
    }
}

#[async_trait]
impl RouterClient for RouterOsClient {
    async fn apply_provisioning_state(
        &self,
        router: &RouterEntity,
        provisioning: &ProvisioningEntity,
        policy: &InternetServiceEntity,
        target: ProvisioningStatus,
    ) -> Result<()> {
        let username = provisioning.pppoe_username.as_str();
        let queue_name = provisioning.queue_name.as_deref();

        match target {
            ProvisioningStatus::Active => {
                self.set_secret_disabled(router, username, false).await?;
                if let Some(queue_name) = queue_name {
                    self.set_queue_rate(router, queue_name, &self.full_rate(policy))
                        .await?;
                }
            }
            ProvisioningStatus::SoftLimited => {
                if let Some(queue_name) = queue_name {
                    self.set_queue_rate(router, queue_name, &self.soft_rate())
                        .await?;
                } else {
                    warn!(
                        router = %router.name,
                        pppoe_username = username,
                        "routeros: no queue to soft-limit; leaving session untouched"
                    );
                }
            }
            ProvisioningStatus::Suspended => {
                self.set_secret_disabled(router, username, true).await?;
                self.drop_active_session(router, username).await;
            }
            ProvisioningStatus::Terminated => {
                self.drop_active_session(router, username).await;
                self.delete_by_name(router, "/ppp/secret", username).await?;
                if let Some(queue_name) = queue_name {
                    self.delete_by_name(router, "/queue/simple", queue_name)
                        .await?;
                }
            }
        }

        debug!(
            router = %router.name,
            pppoe_username = username,
            target = %target,
            "routeros: provisioning state applied"
        );
        Ok(())
    }

    async fn create_session(
        &self,
        router: &RouterEntity,
        provisioning: &NewProvisioningEntity,
        policy: &InternetServiceEntity,
    ) -> Result<()> {
        self.request(
            router,
            Method::PUT,
            "/ppp/secret",
            Some(json!({
                "name": provisioning.pppoe_username,
                "password": provisioning.pppoe_password,
                "service": "pppoe",
                "profile": "default",
            })),
        )
        .await?;

        if let Some(queue_name) = provisioning.queue_name.as_deref() {
            // `<pppoe-user>` is the dynamic interface RouterOS creates for
            // the session.
            self.request(
                router,
                Method::PUT,
                "/queue/simple",
                Some(json!({
                    "name": queue_name,
                    "target": format!("<pppoe-{}>", provisioning.pppoe_username),
                    "max-limit": self.full_rate(policy),
                })),
            )
            .await?;
        }

        Ok(())
    }

    async fn probe(&self, router: &RouterEntity) -> Result<RouterProbe> {
        let started = Instant::now();
        self.request(router, Method::GET, "/system/resource", None)
            .await?;
        let latency_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        Ok(RouterProbe { latency_ms })
    }

    async fn active_sessions(&self, router: &RouterEntity) -> Result<Vec<SessionPing>> {
        let value = self.request(router, Method::GET, "/ppp/active", None).await?;
        let sessions = value.as_array().cloned().unwrap_or_default();

        let mut pings = Vec::with_capacity(sessions.len());
        for session in sessions {
            let Some(name) = session.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(address) = session.get("address").and_then(Value::as_str) else {
                continue;
            };

            let response = self
                .request(
                    router,
                    Method::POST,
                    "/ping",
                    Some(json!({ "address": address, "count": "1" })),
                )
                .await;

            match response {
                Ok(value) => {
                    let time = value
                        .as_array()
                        .and_then(|replies| replies.first())
                        .and_then(|reply| reply.get("time"))
                        .and_then(Value::as_str)
                        .and_then(parse_ping_time_ms);
                    if let Some(latency_ms) = time {
                        pings.push(SessionPing {
                            pppoe_username: name.to_string(),
                            latency_ms,
                        });
                    }
                }
                Err(err) => {
                    warn!(
                        router = %router.name,
                        pppoe_username = name,
                        error = %err,
                        "routeros: session ping failed"
                    );
                }
            }
        }

        Ok(pings)
    }
}

fn format_rate(up_kbps: i32, down_kbps: i32) -> String {
    format!("{}k/{}k", up_kbps.max(0), down_kbps.max(0))
}

/// RouterOS prints ping round-trips as e.g. `853us`, `12ms`, `12ms452us` or
/// `1s52ms`. Sub-millisecond replies round to zero.
fn parse_ping_time_ms(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut total_us: i64 = 0;
    let mut digits = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: i64 = digits.parse().ok()?;
        digits.clear();
        match c {
            's' => total_us += value * 1_000_000,
            'm' => {
                if chars.peek() == Some(&'s') {
                    chars.next();
                    total_us += value * 1_000;
                } else {
                    return None;
                }
            }
            'u' => {
                if chars.peek() == Some(&'s') {
                    chars.next();
                    total_us += value;
                } else {
                    return None;
                }
            }
            _ => return None,
        }
    }
    if !digits.is_empty() {
        return None;
    }

    i32::try_from(total_us / 1_000).ok()
}
