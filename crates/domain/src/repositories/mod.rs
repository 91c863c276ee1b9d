pub mod billing_sweep;
pub mod notification_client;
pub mod payments;
pub mod router_client;
pub mod routers;
