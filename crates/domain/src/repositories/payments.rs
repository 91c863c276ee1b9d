use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::{
    invoices::InvoiceEntity,
    payments::{NewPaymentEntity, PaymentEntity},
};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>>;

    async fn find_payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentEntity>>;

    /// Records the successful payment and marks its invoice paid in one
    /// transaction.
    async fn apply_successful_payment(&self, new_payment: NewPaymentEntity) -> Result<Uuid>;
}
