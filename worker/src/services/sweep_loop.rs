use std::{sync::Arc, time::Duration};

use anyhow::Result;
use application::usecases::billing_sweep::{BillingSweepUseCase, SweepParams};
use chrono::Utc;
use tracing::{error, info};

pub async fn run(
    usecase: Arc<BillingSweepUseCase>,
    interval_secs: u64,
    deadline_secs: Option<u64>,
) -> Result<()> {
    info!(interval_secs, "sweep_loop: starting");
    loop {
        let mut params = SweepParams::at(Utc::now());
        params.deadline = deadline_secs.map(Duration::from_secs);

        match usecase.run(params).await {
            Ok(report) => {
                info!(
                    subscriptions_scanned = report.subscriptions_scanned,
                    actions_attempted = report.actions_attempted,
                    actions_failed = report.actions_failed,
                    "sweep_loop: sweep finished"
                );
            }
            Err(err) => {
                error!(error = %err, "sweep_loop: sweep failed");
            }
        }

        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}
