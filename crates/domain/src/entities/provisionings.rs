use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::provisionings;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = provisionings)]
pub struct ProvisioningEntity {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub router_id: Uuid,
    pub pppoe_username: String,
    pub pppoe_password: String,
    pub ip_address: Option<String>,
    pub queue_name: Option<String>,
    pub status: String,
    pub last_ping_at: Option<DateTime<Utc>>,
    pub ping_latency_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = provisionings)]
pub struct NewProvisioningEntity {
    pub subscription_id: Uuid,
    pub router_id: Uuid,
    pub pppoe_username: String,
    pub pppoe_password: String,
    pub ip_address: Option<String>,
    pub queue_name: Option<String>,
    pub status: String,
}
