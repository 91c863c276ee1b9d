pub mod internet_services;
pub mod invoices;
pub mod payments;
pub mod provisionings;
pub mod reminders;
pub mod routers;
pub mod subscriptions;
