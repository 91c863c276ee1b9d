use chrono::NaiveDate;
use domain::{
    entities::{
        internet_services::InternetServiceEntity, invoices::InvoiceEntity,
        provisionings::ProvisioningEntity, subscriptions::SubscriptionEntity,
    },
    value_objects::{
        enums::{
            invoice_statuses::InvoiceStatus, provisioning_statuses::ProvisioningStatus,
            subscription_statuses::SubscriptionStatus,
        },
        sweep_actions::{ProvisionAction, ProvisionActionKind},
    },
};

/// Snapshot of everything the reconciler needs to decide one subscription.
/// `invoice` is the governing invoice: the open one with the earliest due
/// date, or `None` when every invoice is settled.
pub struct ReconcileInput<'a> {
    pub subscription: &'a SubscriptionEntity,
    pub policy: &'a InternetServiceEntity,
    pub invoice: Option<&'a InvoiceEntity>,
    pub provisioning: Option<&'a ProvisioningEntity>,
}

/// Whole calendar days the invoice is past due; zero before and on the due
/// date, and zero once it no longer awaits payment.
pub fn days_overdue(invoice: &InvoiceEntity, today: NaiveDate) -> i64 {
    if !InvoiceStatus::from_str(&invoice.status).is_open() {
        return 0;
    }
    (today - invoice.due_date).num_days().max(0)
}

/// Target provisioning state as a pure function of subscription status,
/// invoice state and elapsed days past due.
pub fn desired_status(input: &ReconcileInput<'_>, today: NaiveDate) -> ProvisioningStatus {
    match SubscriptionStatus::from_str(&input.subscription.status) {
        SubscriptionStatus::Terminated => return ProvisioningStatus::Terminated,
        // Administrative suspension and not-yet-activated subscriptions keep
        // the session down until an operator flips the subscription back.
        SubscriptionStatus::Suspended | SubscriptionStatus::Inactive => {
            return ProvisioningStatus::Suspended;
        }
        SubscriptionStatus::Active => {}
    }

    let Some(invoice) = input.invoice else {
        // No open invoice also covers the resume rule: a paid invoice stops
        // governing, so the target snaps back to active in one step.
        return ProvisioningStatus::Active;
    };
    if !InvoiceStatus::from_str(&invoice.status).is_open() {
        return ProvisioningStatus::Active;
    }

    let overdue = days_overdue(invoice, today);
    if let Some(suspend_after) = input.policy.auto_suspend {
        if overdue >= i64::from(suspend_after) {
            return ProvisioningStatus::Suspended;
        }
    }
    if let Some(soft_limit_after) = input.policy.auto_soft_limit {
        if overdue >= i64::from(soft_limit_after) {
            return ProvisioningStatus::SoftLimited;
        }
    }
    ProvisioningStatus::Active
}

/// Emits an action only when the target differs from the recorded state, so
/// repeated runs against unchanged input produce nothing.
pub fn reconcile(input: &ReconcileInput<'_>, today: NaiveDate) -> Option<ProvisionAction> {
    let target = desired_status(input, today);

    match input.provisioning {
        Some(provisioning) => {
            if ProvisioningStatus::from_str(&provisioning.status) == target {
                return None;
            }
            Some(ProvisionAction {
                subscription_id: input.subscription.id,
                product_id: input.subscription.product_id,
                target,
                kind: ProvisionActionKind::Transition {
                    provisioning: provisioning.clone(),
                },
            })
        }
        // No session exists yet; anything other than active means there is
        // nothing to tear down either.
        None => (target == ProvisioningStatus::Active).then(|| ProvisionAction {
            subscription_id: input.subscription.id,
            product_id: input.subscription.product_id,
            target,
            kind: ProvisionActionKind::Create,
        }),
    }
}
