use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::payments;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub payment_number: String,
    pub amount_minor: i32,
    pub method: String,
    pub gateway: Option<String>,
    pub transaction_id: Option<String>,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentEntity {
    pub invoice_id: Uuid,
    pub payment_number: String,
    pub amount_minor: i32,
    pub method: String,
    pub gateway: Option<String>,
    pub transaction_id: Option<String>,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
}
