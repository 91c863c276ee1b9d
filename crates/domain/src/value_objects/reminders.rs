use uuid::Uuid;

use crate::value_objects::enums::{
    reminder_channels::ReminderChannel, reminder_stages::ReminderStage,
};

/// Deterministic dedup key for one reminder delivery. The unique constraint
/// on `reminders.idempotency_key` is what makes concurrent sweeps safe: two
/// inserts for the same (invoice, stage, channel) collapse to one row.
pub fn reminder_idempotency_key(
    invoice_id: Uuid,
    stage: ReminderStage,
    channel: ReminderChannel,
) -> String {
    format!("{}:{}:{}", invoice_id, stage.as_str(), channel.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let invoice_id = Uuid::new_v4();
        let a = reminder_idempotency_key(invoice_id, ReminderStage::HPlus1, ReminderChannel::Email);
        let b = reminder_idempotency_key(invoice_id, ReminderStage::HPlus1, ReminderChannel::Email);
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_per_stage_and_channel() {
        let invoice_id = Uuid::new_v4();
        let base =
            reminder_idempotency_key(invoice_id, ReminderStage::HPlus1, ReminderChannel::Email);
        assert_ne!(
            base,
            reminder_idempotency_key(invoice_id, ReminderStage::HMinus1, ReminderChannel::Email)
        );
        assert_ne!(
            base,
            reminder_idempotency_key(invoice_id, ReminderStage::HPlus1, ReminderChannel::Sms)
        );
    }
}
