use uuid::Uuid;

use crate::{
    entities::{invoices::InvoiceEntity, provisionings::ProvisioningEntity},
    value_objects::enums::{
        provisioning_statuses::ProvisioningStatus, reminder_channels::ReminderChannel,
        reminder_stages::ReminderStage,
    },
};

/// How a provisioning action must be applied: push a state change to an
/// existing session, or provision the subscription from scratch.
#[derive(Debug, Clone)]
pub enum ProvisionActionKind {
    Create,
    Transition { provisioning: ProvisioningEntity },
}

#[derive(Debug, Clone)]
pub struct ProvisionAction {
    pub subscription_id: Uuid,
    pub product_id: Uuid,
    pub target: ProvisioningStatus,
    pub kind: ProvisionActionKind,
}

#[derive(Debug, Clone)]
pub struct ReminderAction {
    pub invoice: InvoiceEntity,
    pub stage: ReminderStage,
    pub channel: ReminderChannel,
    pub idempotency_key: String,
}

/// One intended side effect computed from a subscription snapshot. Snapshots
/// in, intended mutations out; nothing here touches the database.
#[derive(Debug, Clone)]
pub enum SweepAction {
    Provision(ProvisionAction),
    Remind(ReminderAction),
}
