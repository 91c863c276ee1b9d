use application::retry::RetryPolicy;
use domain::value_objects::enums::reminder_channels::ReminderChannel;
use infra::{
    notifications::gateway::NotificationGatewayConfig, routeros::client::RouterOsConfig,
};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub sweep: SweepConfig,
    pub router_health: RouterHealthConfig,
    pub retry: RetryPolicy,
    pub router_os: RouterOsConfig,
    pub notification_gateway: NotificationGatewayConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval_secs: u64,
    pub concurrency: usize,
    pub deadline_secs: Option<u64>,
    pub channels: Vec<ReminderChannel>,
    /// Bearer token guarding the internal trigger endpoints; absent means
    /// the endpoints refuse to run.
    pub internal_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RouterHealthConfig {
    pub interval_secs: u64,
}
