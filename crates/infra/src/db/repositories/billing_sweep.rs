use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::postgres::postgres_connection::PgPool;
use domain::{
    entities::{
        internet_services::InternetServiceEntity,
        invoices::InvoiceEntity,
        provisionings::{NewProvisioningEntity, ProvisioningEntity},
        reminders::{NewReminderEntity, ReminderEntity},
        routers::RouterEntity,
        subscriptions::SubscriptionEntity,
    },
    repositories::billing_sweep::BillingSweepRepository,
    schema::{internet_services, invoices, provisionings, reminders, routers, subscriptions},
    value_objects::enums::{
        invoice_statuses::InvoiceStatus, provisioning_statuses::ProvisioningStatus,
        reminder_statuses::ReminderStatus, router_statuses::RouterStatus,
        subscription_statuses::SubscriptionStatus,
    },
};

pub struct BillingSweepPostgres {
    db_pool: Arc<PgPool>,
}

impl BillingSweepPostgres {
    pub fn new(db_pool: Arc<PgPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BillingSweepRepository for BillingSweepPostgres {
    async fn mark_overdue_invoices(&self, today: NaiveDate) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(invoices::table)
            .filter(invoices::status.eq(InvoiceStatus::Unpaid.as_str()))
            .filter(invoices::due_date.lt(today))
            .set(invoices::status.eq(InvoiceStatus::Overdue.as_str()))
            .execute(&mut conn)?;

        Ok(updated)
    }

    async fn list_due_subscriptions(&self, limit: Option<i64>) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Terminated subscriptions drop out once their provisioning is torn
        // down; until then they stay candidates so the teardown happens.
        let mut query = subscriptions::table
            .left_join(provisionings::table)
            .filter(
                subscriptions::status
                    .ne(SubscriptionStatus::Terminated.to_string())
                    .or(provisionings::status.ne(ProvisioningStatus::Terminated.to_string())),
            )
            .order(subscriptions::created_at.asc())
            .select(SubscriptionEntity::as_select())
            .into_boxed();

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let results = query.load::<SubscriptionEntity>(&mut conn)?;
        Ok(results)
    }

    async fn find_service_policy(
        &self,
        product_id: Uuid,
    ) -> Result<Option<InternetServiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = internet_services::table
            .filter(internet_services::product_id.eq(product_id))
            .select(InternetServiceEntity::as_select())
            .first::<InternetServiceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_governing_invoice(&self, subscription_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = invoices::table
            .filter(invoices::subscription_id.eq(subscription_id))
            .filter(invoices::status.eq_any(vec![
                InvoiceStatus::Unpaid.as_str(),
                InvoiceStatus::Overdue.as_str(),
            ]))
            .order(invoices::due_date.asc())
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_provisioning(&self, subscription_id: Uuid) -> Result<Option<ProvisioningEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = provisionings::table
            .filter(provisionings::subscription_id.eq(subscription_id))
            .select(ProvisioningEntity::as_select())
            .first::<ProvisioningEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_reminders(&self, invoice_id: Uuid) -> Result<Vec<ReminderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = reminders::table
            .filter(reminders::invoice_id.eq(invoice_id))
            .select(ReminderEntity::as_select())
            .load::<ReminderEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_router(&self, router_id: Uuid) -> Result<Option<RouterEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = routers::table
            .find(router_id)
            .select(RouterEntity::as_select())
            .first::<RouterEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_available_router(&self) -> Result<Option<RouterEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = routers::table
            .filter(routers::status.eq(RouterStatus::Online.as_str()))
            .order(routers::created_at.asc())
            .select(RouterEntity::as_select())
            .first::<RouterEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn insert_provisioning(&self, new_provisioning: NewProvisioningEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(provisionings::table)
            .values(&new_provisioning)
            .returning(provisionings::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn update_provisioning_status(
        &self,
        provisioning_id: Uuid,
        status: ProvisioningStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(provisionings::table)
            .filter(provisionings::id.eq(provisioning_id))
            .set((
                provisionings::status.eq(status.to_string()),
                provisionings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn insert_reminder_if_absent(&self, new_reminder: NewReminderEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The unique index on idempotency_key arbitrates concurrent sweeps;
        // zero affected rows means someone else already claimed this key.
        let inserted = insert_into(reminders::table)
            .values(&new_reminder)
            .on_conflict(reminders::idempotency_key)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }

    async fn mark_reminder_failed(
        &self,
        idempotency_key: &str,
        error_message: &str,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(reminders::table)
            .filter(reminders::idempotency_key.eq(idempotency_key))
            .set((
                reminders::status.eq(ReminderStatus::Failed.as_str()),
                reminders::error_message.eq(Some(error_message)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
