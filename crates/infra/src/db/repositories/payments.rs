use anyhow::Result;
use async_trait::async_trait;
use diesel::{Connection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::postgres::postgres_connection::PgPool;
use domain::{
    entities::{
        invoices::InvoiceEntity,
        payments::{NewPaymentEntity, PaymentEntity},
    },
    repositories::payments::PaymentRepository,
    schema::{invoices, payments},
    value_objects::enums::invoice_statuses::InvoiceStatus,
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPool>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoices::table
            .find(invoice_id)
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payments::table
            .filter(payments::transaction_id.eq(transaction_id))
            .select(PaymentEntity::as_select())
            .first::<PaymentEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn apply_successful_payment(&self, new_payment: NewPaymentEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Payment row and invoice settle together or not at all.
        let payment_id = conn.transaction::<Uuid, diesel::result::Error, _>(|conn| {
            let payment_id = insert_into(payments::table)
                .values(&new_payment)
                .returning(payments::id)
                .get_result::<Uuid>(conn)?;

            update(invoices::table)
                .filter(invoices::id.eq(new_payment.invoice_id))
                .set((
                    invoices::status.eq(InvoiceStatus::Paid.as_str()),
                    invoices::paid_at.eq(new_payment.paid_at),
                ))
                .execute(conn)?;

            Ok(payment_id)
        })?;

        Ok(payment_id)
    }
}
