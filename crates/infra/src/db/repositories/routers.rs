use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::postgres::postgres_connection::PgPool;
use domain::{
    entities::routers::RouterEntity,
    repositories::{router_client::SessionPing, routers::RouterRepository},
    schema::{provisionings, routers},
    value_objects::enums::router_statuses::RouterStatus,
};

pub struct RouterPostgres {
    db_pool: Arc<PgPool>,
}

impl RouterPostgres {
    pub fn new(db_pool: Arc<PgPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RouterRepository for RouterPostgres {
    async fn list_routers(&self) -> Result<Vec<RouterEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = routers::table
            .order(routers::created_at.asc())
            .select(RouterEntity::as_select())
            .load::<RouterEntity>(&mut conn)?;

        Ok(results)
    }

    async fn update_router_health(
        &self,
        router_id: Uuid,
        status: RouterStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(routers::table)
            .filter(routers::id.eq(router_id))
            .set((
                routers::status.eq(status.as_str()),
                routers::last_check_at.eq(Some(checked_at)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn record_session_pings(
        &self,
        router_id: Uuid,
        pings: Vec<SessionPing>,
        pinged_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        for ping in pings {
            update(provisionings::table)
                .filter(provisionings::router_id.eq(router_id))
                .filter(provisionings::pppoe_username.eq(&ping.pppoe_username))
                .set((
                    provisionings::last_ping_at.eq(Some(pinged_at)),
                    provisionings::ping_latency_ms.eq(Some(ping.latency_ms)),
                ))
                .execute(&mut conn)?;
        }

        Ok(())
    }
}
