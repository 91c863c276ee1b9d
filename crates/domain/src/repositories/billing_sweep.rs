use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::{
    entities::{
        internet_services::InternetServiceEntity,
        invoices::InvoiceEntity,
        provisionings::{NewProvisioningEntity, ProvisioningEntity},
        reminders::{NewReminderEntity, ReminderEntity},
        routers::RouterEntity,
        subscriptions::SubscriptionEntity,
    },
    value_objects::enums::provisioning_statuses::ProvisioningStatus,
};

/// Persistence surface of the sweep. Reads return snapshots; writes are the
/// only mutations the engine performs. `insert_reminder_if_absent` must be
/// backed by the unique idempotency-key constraint so concurrent sweeps
/// resolve duplicates at the data layer.
#[async_trait]
#[automock]
pub trait BillingSweepRepository {
    async fn mark_overdue_invoices(&self, today: NaiveDate) -> Result<usize>;

    /// Candidates for reconciliation: every non-terminated subscription, plus
    /// terminated ones whose provisioning has not been torn down yet.
    async fn list_due_subscriptions(&self, limit: Option<i64>) -> Result<Vec<SubscriptionEntity>>;

    async fn find_service_policy(&self, product_id: Uuid)
    -> Result<Option<InternetServiceEntity>>;

    /// The invoice governing the provisioning decision window: the open
    /// (unpaid/overdue) invoice with the earliest due date.
    async fn find_governing_invoice(&self, subscription_id: Uuid) -> Result<Option<InvoiceEntity>>;

    async fn find_provisioning(&self, subscription_id: Uuid) -> Result<Option<ProvisioningEntity>>;

    async fn list_reminders(&self, invoice_id: Uuid) -> Result<Vec<ReminderEntity>>;

    async fn find_router(&self, router_id: Uuid) -> Result<Option<RouterEntity>>;

    /// An online router for fresh provisionings.
    async fn find_available_router(&self) -> Result<Option<RouterEntity>>;

    async fn insert_provisioning(&self, new_provisioning: NewProvisioningEntity) -> Result<Uuid>;

    async fn update_provisioning_status(
        &self,
        provisioning_id: Uuid,
        status: ProvisioningStatus,
    ) -> Result<()>;

    /// Returns `false` when the idempotency key is already claimed.
    async fn insert_reminder_if_absent(&self, new_reminder: NewReminderEntity) -> Result<bool>;

    async fn mark_reminder_failed(&self, idempotency_key: &str, error_message: &str)
    -> Result<()>;
}
