use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{
    entities::payments::NewPaymentEntity,
    repositories::payments::PaymentRepository,
    value_objects::enums::{invoice_statuses::InvoiceStatus, payment_statuses::PaymentStatus},
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordPaymentError {
    #[error("invoice not found")]
    InvoiceNotFound,
    #[error("invoice is cancelled")]
    InvoiceCancelled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RecordPaymentResult<T> = std::result::Result<T, RecordPaymentError>;

#[derive(Debug, Clone)]
pub struct RecordPaymentParams {
    pub invoice_id: Uuid,
    pub amount_minor: i32,
    pub method: String,
    pub gateway: Option<String>,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentApplication {
    Applied { payment_id: Uuid },
    AlreadyApplied { payment_id: Uuid },
}

/// Applies a gateway success confirmation. Idempotent on the transaction id:
/// replays and double-deliveries resolve to `AlreadyApplied` without touching
/// the invoice a second time.
pub struct RecordPaymentUseCase {
    payment_repo: Arc<dyn PaymentRepository + Send + Sync>,
}

impl RecordPaymentUseCase {
    pub fn new(payment_repo: Arc<dyn PaymentRepository + Send + Sync>) -> Self {
        Self { payment_repo }
    }

    pub async fn run(&self, params: RecordPaymentParams) -> RecordPaymentResult<PaymentApplication> {
        if let Some(existing) = self
            .payment_repo
            .find_payment_by_transaction_id(&params.transaction_id)
            .await?
        {
            info!(
                invoice_id = %params.invoice_id,
                transaction_id = %params.transaction_id,
                payment_id = %existing.id,
                "record_payment: duplicate confirmation ignored"
            );
            return Ok(PaymentApplication::AlreadyApplied {
                payment_id: existing.id,
            });
        }

        let invoice = self
            .payment_repo
            .find_invoice(params.invoice_id)
            .await?
            .ok_or(RecordPaymentError::InvoiceNotFound)?;

        if InvoiceStatus::from_str(&invoice.status) == InvoiceStatus::Cancelled {
            warn!(
                invoice_id = %invoice.id,
                transaction_id = %params.transaction_id,
                "record_payment: payment arrived for a cancelled invoice"
            );
            return Err(RecordPaymentError::InvoiceCancelled);
        }

        let payment_id = self
            .payment_repo
            .apply_successful_payment(NewPaymentEntity {
                invoice_id: invoice.id,
                payment_number: format!("PAY-{}", params.transaction_id),
                amount_minor: params.amount_minor,
                method: params.method,
                gateway: params.gateway,
                transaction_id: Some(params.transaction_id),
                status: PaymentStatus::Success.to_string(),
                paid_at: Some(params.paid_at),
            })
            .await?;

        info!(
            invoice_id = %invoice.id,
            %payment_id,
            "record_payment: invoice settled"
        );

        Ok(PaymentApplication::Applied { payment_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::{
        entities::{invoices::InvoiceEntity, payments::PaymentEntity},
        repositories::payments::MockPaymentRepository,
    };
    use mockall::predicate::eq;

    fn params(invoice_id: Uuid) -> RecordPaymentParams {
        RecordPaymentParams {
            invoice_id,
            amount_minor: 29_900,
            method: "bank_transfer".to_string(),
            gateway: Some("midtrans".to_string()),
            transaction_id: "trx-8891".to_string(),
            paid_at: Utc::now(),
        }
    }

    fn invoice(id: Uuid, status: InvoiceStatus) -> InvoiceEntity {
        InvoiceEntity {
            id,
            subscription_id: Uuid::new_v4(),
            invoice_number: "INV-0042".to_string(),
            amount_minor: 29_900,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            status: status.to_string(),
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    fn payment(id: Uuid) -> PaymentEntity {
        PaymentEntity {
            id,
            invoice_id: Uuid::new_v4(),
            payment_number: "PAY-trx-8891".to_string(),
            amount_minor: 29_900,
            method: "bank_transfer".to_string(),
            gateway: Some("midtrans".to_string()),
            transaction_id: Some("trx-8891".to_string()),
            status: PaymentStatus::Success.to_string(),
            paid_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_confirmation_settles_the_invoice() {
        let invoice_id = Uuid::new_v4();
        let payment_id = Uuid::new_v4();

        let mut repo = MockPaymentRepository::new();
        repo.expect_find_payment_by_transaction_id()
            .with(eq("trx-8891"))
            .returning(|_| Box::pin(async { Ok(None) }));
        let invoice_row = invoice(invoice_id, InvoiceStatus::Unpaid);
        repo.expect_find_invoice()
            .with(eq(invoice_id))
            .returning(move |_| {
                let invoice = invoice_row.clone();
                Box::pin(async move { Ok(Some(invoice)) })
            });
        repo.expect_apply_successful_payment()
            .withf(move |row| {
                row.invoice_id == invoice_id
                    && row.transaction_id.as_deref() == Some("trx-8891")
                    && row.status == PaymentStatus::Success.to_string()
            })
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(payment_id) }));

        let usecase = RecordPaymentUseCase::new(Arc::new(repo));
        let outcome = usecase.run(params(invoice_id)).await.unwrap();

        assert_eq!(outcome, PaymentApplication::Applied { payment_id });
    }

    #[tokio::test]
    async fn duplicate_confirmation_is_a_no_op() {
        let invoice_id = Uuid::new_v4();
        let payment_id = Uuid::new_v4();

        let mut repo = MockPaymentRepository::new();
        let existing = payment(payment_id);
        repo.expect_find_payment_by_transaction_id()
            .returning(move |_| {
                let payment = existing.clone();
                Box::pin(async move { Ok(Some(payment)) })
            });
        repo.expect_find_invoice().times(0);
        repo.expect_apply_successful_payment().times(0);

        let usecase = RecordPaymentUseCase::new(Arc::new(repo));
        let outcome = usecase.run(params(invoice_id)).await.unwrap();

        assert_eq!(outcome, PaymentApplication::AlreadyApplied { payment_id });
    }

    #[tokio::test]
    async fn unknown_invoice_is_rejected() {
        let mut repo = MockPaymentRepository::new();
        repo.expect_find_payment_by_transaction_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_find_invoice()
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_apply_successful_payment().times(0);

        let usecase = RecordPaymentUseCase::new(Arc::new(repo));
        let err = usecase.run(params(Uuid::new_v4())).await.unwrap_err();

        assert!(matches!(err, RecordPaymentError::InvoiceNotFound));
    }

    #[tokio::test]
    async fn cancelled_invoice_is_rejected() {
        let invoice_id = Uuid::new_v4();

        let mut repo = MockPaymentRepository::new();
        repo.expect_find_payment_by_transaction_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        let invoice_row = invoice(invoice_id, InvoiceStatus::Cancelled);
        repo.expect_find_invoice().returning(move |_| {
            let invoice = invoice_row.clone();
            Box::pin(async move { Ok(Some(invoice)) })
        });
        repo.expect_apply_successful_payment().times(0);

        let usecase = RecordPaymentUseCase::new(Arc::new(repo));
        let err = usecase.run(params(invoice_id)).await.unwrap_err();

        assert!(matches!(err, RecordPaymentError::InvoiceCancelled));
    }
}
