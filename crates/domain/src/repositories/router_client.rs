use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::{
    entities::{
        internet_services::InternetServiceEntity,
        provisionings::{NewProvisioningEntity, ProvisioningEntity},
        routers::RouterEntity,
    },
    value_objects::enums::provisioning_statuses::ProvisioningStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterProbe {
    pub latency_ms: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPing {
    pub pppoe_username: String,
    pub latency_ms: i32,
}

/// Router-side collaborator. Implementations must report failures through
/// `CollaboratorError` so the executor can tell transient outages from
/// misconfiguration.
#[async_trait]
#[automock]
pub trait RouterClient {
    /// Materializes `target` for an existing session: enable/disable the
    /// PPPoE secret, adjust the queue, or tear both down.
    async fn apply_provisioning_state(
        &self,
        router: &RouterEntity,
        provisioning: &ProvisioningEntity,
        policy: &InternetServiceEntity,
        target: ProvisioningStatus,
    ) -> Result<()>;

    /// Pushes a brand-new PPPoE secret and queue for a subscription.
    async fn create_session(
        &self,
        router: &RouterEntity,
        provisioning: &NewProvisioningEntity,
        policy: &InternetServiceEntity,
    ) -> Result<()>;

    async fn probe(&self, router: &RouterEntity) -> Result<RouterProbe>;

    async fn active_sessions(&self, router: &RouterEntity) -> Result<Vec<SessionPing>>;
}
