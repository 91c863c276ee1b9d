use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::{
    entities::invoices::InvoiceEntity,
    value_objects::enums::{reminder_channels::ReminderChannel, reminder_stages::ReminderStage},
};

/// Messaging collaborator. Recipient resolution (customer email/phone lookup)
/// belongs to the gateway; the engine only names the invoice and stage.
#[async_trait]
#[automock]
pub trait NotificationClient {
    async fn send(
        &self,
        channel: ReminderChannel,
        invoice: &InvoiceEntity,
        stage: ReminderStage,
    ) -> Result<()>;
}
