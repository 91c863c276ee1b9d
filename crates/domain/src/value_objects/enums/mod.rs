pub mod invoice_statuses;
pub mod payment_statuses;
pub mod provisioning_statuses;
pub mod reminder_channels;
pub mod reminder_stages;
pub mod reminder_statuses;
pub mod router_statuses;
pub mod subscription_statuses;
