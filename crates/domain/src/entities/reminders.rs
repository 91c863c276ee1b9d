use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::reminders;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = reminders)]
pub struct ReminderEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub channel: String,
    pub stage: String,
    pub sent_at: DateTime<Utc>,
    pub status: String,
    pub error_message: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reminders)]
pub struct NewReminderEntity {
    pub invoice_id: Uuid,
    pub channel: String,
    pub stage: String,
    pub sent_at: DateTime<Utc>,
    pub status: String,
    pub error_message: Option<String>,
    pub idempotency_key: String,
}
