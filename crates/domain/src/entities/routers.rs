use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::routers;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = routers)]
pub struct RouterEntity {
    pub id: Uuid,
    pub name: String,
    pub host: String,
    pub api_port: i32,
    pub username: String,
    pub password: String,
    pub status: String,
    pub last_check_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
