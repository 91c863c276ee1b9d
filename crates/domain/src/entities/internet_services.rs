use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::internet_services;

/// Service policy attached to a product: bandwidth plus the day thresholds
/// that drive automatic soft-limit and suspension.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = internet_services)]
pub struct InternetServiceEntity {
    pub id: Uuid,
    pub product_id: Uuid,
    pub bandwidth_down_kbps: i32,
    pub bandwidth_up_kbps: i32,
    pub auto_soft_limit: Option<i32>,
    pub auto_suspend: Option<i32>,
    pub quota_limit_mb: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
