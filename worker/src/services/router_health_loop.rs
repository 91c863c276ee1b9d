use std::{sync::Arc, time::Duration};

use anyhow::Result;
use application::usecases::router_health::RouterHealthUseCase;
use chrono::Utc;
use tracing::{error, info};

pub async fn run(usecase: Arc<RouterHealthUseCase>, interval_secs: u64) -> Result<()> {
    info!(interval_secs, "router_health_loop: starting");
    loop {
        match usecase.run(Utc::now()).await {
            Ok(report) => {
                info!(
                    routers_checked = report.routers_checked,
                    routers_online = report.routers_online,
                    routers_unreachable = report.routers_unreachable,
                    sessions_pinged = report.sessions_pinged,
                    "router_health_loop: pass finished"
                );
            }
            Err(err) => {
                error!(error = %err, "router_health_loop: pass failed");
            }
        }

        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}
