use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use domain::{
    repositories::{router_client::RouterClient, routers::RouterRepository},
    value_objects::{collaborator_errors::is_retryable, enums::router_statuses::RouterStatus},
};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct RouterHealthReport {
    pub routers_checked: usize,
    pub routers_online: usize,
    pub routers_unreachable: usize,
    pub sessions_pinged: usize,
}

/// Probes every router and records the result. Unreachable routers go
/// `offline`; a rejection that no retry can fix (bad credentials, bad
/// request) goes `error` so operators can tell the two apart.
pub struct RouterHealthUseCase {
    repository: Arc<dyn RouterRepository + Send + Sync>,
    router_client: Arc<dyn RouterClient + Send + Sync>,
}

impl RouterHealthUseCase {
    pub fn new(
        repository: Arc<dyn RouterRepository + Send + Sync>,
        router_client: Arc<dyn RouterClient + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            router_client,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RouterHealthReport> {
        let routers = self.repository.list_routers().await?;
        let mut report = RouterHealthReport {
            routers_checked: routers.len(),
            ..Default::default()
        };

        for router in routers {
            match self.router_client.probe(&router).await {
                Ok(probe) => {
                    report.routers_online += 1;
                    self.repository
                        .update_router_health(router.id, RouterStatus::Online, now)
                        .await?;

                    match self.router_client.active_sessions(&router).await {
                        Ok(pings) => {
                            report.sessions_pinged += pings.len();
                            self.repository
                                .record_session_pings(router.id, pings, now)
                                .await?;
                        }
                        Err(err) => {
                            warn!(
                                router_id = %router.id,
                                error = %err,
                                "router_health: session listing failed"
                            );
                        }
                    }

                    info!(
                        router_id = %router.id,
                        router = %router.name,
                        latency_ms = probe.latency_ms,
                        "router_health: router online"
                    );
                }
                Err(err) => {
                    report.routers_unreachable += 1;
                    let status = if is_retryable(&err) {
                        RouterStatus::Offline
                    } else {
                        RouterStatus::Error
                    };
                    warn!(
                        router_id = %router.id,
                        router = %router.name,
                        status = %status,
                        error = %err,
                        "router_health: probe failed"
                    );
                    self.repository
                        .update_router_health(router.id, status, now)
                        .await?;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        entities::routers::RouterEntity,
        repositories::{
            router_client::{MockRouterClient, RouterProbe, SessionPing},
            routers::MockRouterRepository,
        },
        value_objects::collaborator_errors::CollaboratorError,
    };
    use uuid::Uuid;

    fn router(name: &str) -> RouterEntity {
        RouterEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            host: "192.0.2.10".to_string(),
            api_port: 443,
            username: "api".to_string(),
            password: "api".to_string(),
            status: RouterStatus::Offline.to_string(),
            last_check_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reachable_router_goes_online_and_pings_sessions() {
        let rtr = router("edge-01");
        let router_id = rtr.id;

        let mut repo = MockRouterRepository::new();
        repo.expect_list_routers().returning(move || {
            let rtr = rtr.clone();
            Box::pin(async move { Ok(vec![rtr]) })
        });
        repo.expect_update_router_health()
            .withf(move |id, status, _| *id == router_id && *status == RouterStatus::Online)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        repo.expect_record_session_pings()
            .withf(move |id, pings, _| *id == router_id && pings.len() == 2)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut client = MockRouterClient::new();
        client
            .expect_probe()
            .returning(|_| Box::pin(async { Ok(RouterProbe { latency_ms: 12 }) }));
        client.expect_active_sessions().returning(|_| {
            Box::pin(async {
                Ok(vec![
                    SessionPing {
                        pppoe_username: "sub-aabbccdd".to_string(),
                        latency_ms: 9,
                    },
                    SessionPing {
                        pppoe_username: "sub-11223344".to_string(),
                        latency_ms: 31,
                    },
                ])
            })
        });

        let report = RouterHealthUseCase::new(Arc::new(repo), Arc::new(client))
            .run(Utc::now())
            .await
            .unwrap();

        assert_eq!(report.routers_checked, 1);
        assert_eq!(report.routers_online, 1);
        assert_eq!(report.sessions_pinged, 2);
    }

    #[tokio::test]
    async fn unreachable_router_is_marked_offline() {
        let rtr = router("edge-02");
        let router_id = rtr.id;

        let mut repo = MockRouterRepository::new();
        repo.expect_list_routers().returning(move || {
            let rtr = rtr.clone();
            Box::pin(async move { Ok(vec![rtr]) })
        });
        repo.expect_update_router_health()
            .withf(move |id, status, _| *id == router_id && *status == RouterStatus::Offline)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut client = MockRouterClient::new();
        client.expect_probe().returning(|_| {
            Box::pin(async { Err(CollaboratorError::retryable("connect timeout")) })
        });
        client.expect_active_sessions().times(0);

        let report = RouterHealthUseCase::new(Arc::new(repo), Arc::new(client))
            .run(Utc::now())
            .await
            .unwrap();

        assert_eq!(report.routers_unreachable, 1);
    }

    #[tokio::test]
    async fn rejected_probe_is_marked_error() {
        let rtr = router("edge-03");
        let router_id = rtr.id;

        let mut repo = MockRouterRepository::new();
        repo.expect_list_routers().returning(move || {
            let rtr = rtr.clone();
            Box::pin(async move { Ok(vec![rtr]) })
        });
        repo.expect_update_router_health()
            .withf(move |id, status, _| *id == router_id && *status == RouterStatus::Error)
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let mut client = MockRouterClient::new();
        client.expect_probe().returning(|_| {
            Box::pin(async { Err(CollaboratorError::permanent("401 unauthorized")) })
        });

        let report = RouterHealthUseCase::new(Arc::new(repo), Arc::new(client))
            .run(Utc::now())
            .await
            .unwrap();

        assert_eq!(report.routers_unreachable, 1);
    }
}
