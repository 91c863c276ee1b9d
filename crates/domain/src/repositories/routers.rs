use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::{
    entities::routers::RouterEntity,
    repositories::router_client::SessionPing,
    value_objects::enums::router_statuses::RouterStatus,
};

#[async_trait]
#[automock]
pub trait RouterRepository {
    async fn list_routers(&self) -> Result<Vec<RouterEntity>>;

    async fn update_router_health(
        &self,
        router_id: Uuid,
        status: RouterStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Refreshes `last_ping_at`/`ping_latency_ms` on the provisionings whose
    /// PPPoE usernames appear in `pings`.
    async fn record_session_pings(
        &self,
        router_id: Uuid,
        pings: Vec<SessionPing>,
        pinged_at: DateTime<Utc>,
    ) -> Result<()>;
}
