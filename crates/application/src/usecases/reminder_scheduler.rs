use chrono::NaiveDate;
use domain::{
    entities::{
        internet_services::InternetServiceEntity, invoices::InvoiceEntity,
        reminders::ReminderEntity,
    },
    value_objects::{
        enums::{
            invoice_statuses::InvoiceStatus, reminder_channels::ReminderChannel,
            reminder_stages::ReminderStage,
        },
        reminders::reminder_idempotency_key,
        sweep_actions::ReminderAction,
    },
};

/// Stages newly due for an invoice on `today`, one action per configured
/// channel. A (stage, channel) whose idempotency key already has a reminder
/// row — sent or failed — is never emitted again; re-claiming under
/// concurrency is left to the unique constraint at execution time.
pub fn due_reminders(
    invoice: &InvoiceEntity,
    policy: &InternetServiceEntity,
    existing: &[ReminderEntity],
    channels: &[ReminderChannel],
    today: NaiveDate,
) -> Vec<ReminderAction> {
    if !InvoiceStatus::from_str(&invoice.status).is_open() {
        return Vec::new();
    }

    let mut actions = Vec::new();
    for stage in ReminderStage::ALL {
        let Some(due_on) = stage.due_on(invoice.due_date, policy) else {
            continue;
        };
        if today < due_on {
            continue;
        }

        for &channel in channels {
            let idempotency_key = reminder_idempotency_key(invoice.id, stage, channel);
            if existing.iter().any(|r| r.idempotency_key == idempotency_key) {
                continue;
            }
            actions.push(ReminderAction {
                invoice: invoice.clone(),
                stage,
                channel,
                idempotency_key,
            });
        }
    }
    actions
}
