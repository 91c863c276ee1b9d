use std::{future::Future, sync::Arc};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use domain::{
    entities::{provisionings::NewProvisioningEntity, reminders::NewReminderEntity},
    repositories::{
        billing_sweep::BillingSweepRepository, notification_client::NotificationClient,
        router_client::RouterClient,
    },
    value_objects::{
        collaborator_errors::is_retryable,
        enums::{provisioning_statuses::ProvisioningStatus, reminder_statuses::ReminderStatus},
        sweep_actions::{ProvisionAction, ProvisionActionKind, ReminderAction, SweepAction},
    },
};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::retry::RetryPolicy;

/// Applies computed sweep actions against the router and notification
/// collaborators. Transient failures burn the retry budget with exponential
/// backoff; permanent ones fail immediately. Nothing here re-queues within a
/// sweep — a failed action waits for the next one.
pub struct ActionExecutor {
    repository: Arc<dyn BillingSweepRepository + Send + Sync>,
    router_client: Arc<dyn RouterClient + Send + Sync>,
    notification_client: Arc<dyn NotificationClient + Send + Sync>,
    retry: RetryPolicy,
}

impl ActionExecutor {
    pub fn new(
        repository: Arc<dyn BillingSweepRepository + Send + Sync>,
        router_client: Arc<dyn RouterClient + Send + Sync>,
        notification_client: Arc<dyn NotificationClient + Send + Sync>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            router_client,
            notification_client,
            retry,
        }
    }

    pub async fn execute(&self, action: SweepAction, now: DateTime<Utc>) -> Result<()> {
        match action {
            SweepAction::Provision(action) => self.execute_provision(&action).await,
            SweepAction::Remind(action) => self.execute_remind(&action, now).await,
        }
    }

    async fn execute_provision(&self, action: &ProvisionAction) -> Result<()> {
        let policy = self
            .repository
            .find_service_policy(action.product_id)
            .await?
            .ok_or_else(|| {
                anyhow!("service policy missing for product {}", action.product_id)
            })?;

        match &action.kind {
            ProvisionActionKind::Transition { provisioning } => {
                let router = self
                    .repository
                    .find_router(provisioning.router_id)
                    .await?
                    .ok_or_else(|| anyhow!("router {} not found", provisioning.router_id))?;

                self.with_retries(|| {
                    self.router_client.apply_provisioning_state(
                        &router,
                        provisioning,
                        &policy,
                        action.target,
                    )
                })
                .await?;

                // DB write happens only after the router accepted the change,
                // so a failed push leaves the row pointing at the real state.
                self.repository
                    .update_provisioning_status(provisioning.id, action.target)
                    .await?;
            }
            ProvisionActionKind::Create => {
                let router = self
                    .repository
                    .find_available_router()
                    .await?
                    .ok_or_else(|| anyhow!("no online router available for provisioning"))?;

                let new_provisioning = build_provisioning(action.subscription_id, router.id);
                self.with_retries(|| {
                    self.router_client
                        .create_session(&router, &new_provisioning, &policy)
                })
                .await?;

                let provisioning_id =
                    self.repository.insert_provisioning(new_provisioning).await?;
                debug!(
                    subscription_id = %action.subscription_id,
                    %provisioning_id,
                    router_id = %router.id,
                    "action_executor: subscription provisioned"
                );
            }
        }

        Ok(())
    }

    async fn execute_remind(&self, action: &ReminderAction, now: DateTime<Utc>) -> Result<()> {
        // Claim the idempotency key before any send attempt. A lost claim
        // means another sweep owns this delivery; that is a success here.
        let claimed = self
            .repository
            .insert_reminder_if_absent(NewReminderEntity {
                invoice_id: action.invoice.id,
                channel: action.channel.to_string(),
                stage: action.stage.to_string(),
                sent_at: now,
                status: ReminderStatus::Sent.to_string(),
                error_message: None,
                idempotency_key: action.idempotency_key.clone(),
            })
            .await?;

        if !claimed {
            debug!(
                invoice_id = %action.invoice.id,
                stage = %action.stage,
                channel = %action.channel,
                "action_executor: reminder already claimed; skipping send"
            );
            return Ok(());
        }

        let send_result = self
            .with_retries(|| {
                self.notification_client
                    .send(action.channel, &action.invoice, action.stage)
            })
            .await;

        if let Err(err) = send_result {
            if let Err(mark_err) = self
                .repository
                .mark_reminder_failed(&action.idempotency_key, &err.to_string())
                .await
            {
                error!(
                    invoice_id = %action.invoice.id,
                    stage = %action.stage,
                    error = %mark_err,
                    "action_executor: failed to record reminder failure"
                );
            }
            return Err(err);
        }

        Ok(())
    }

    async fn with_retries<F, Fut>(&self, mut operation: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if !is_retryable(&err) {
                        warn!(attempt, error = %err, "action_executor: permanent collaborator error");
                        return Err(err);
                    }
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    let backoff = self.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "action_executor: transient collaborator error; backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn build_provisioning(subscription_id: Uuid, router_id: Uuid) -> NewProvisioningEntity {
    let short_id = subscription_id.simple().to_string();
    let short_id = &short_id[..8];
    let pppoe_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    NewProvisioningEntity {
        subscription_id,
        router_id,
        pppoe_username: format!("sub-{short_id}"),
        pppoe_password,
        ip_address: None,
        queue_name: Some(format!("queue-sub-{short_id}")),
        status: ProvisioningStatus::Active.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::{
        entities::{
            internet_services::InternetServiceEntity, invoices::InvoiceEntity,
            provisionings::ProvisioningEntity, routers::RouterEntity,
        },
        repositories::{
            billing_sweep::MockBillingSweepRepository,
            notification_client::MockNotificationClient, router_client::MockRouterClient,
        },
        value_objects::{
            collaborator_errors::CollaboratorError,
            enums::{
                invoice_statuses::InvoiceStatus, reminder_channels::ReminderChannel,
                reminder_stages::ReminderStage, router_statuses::RouterStatus,
            },
            reminders::reminder_idempotency_key,
        },
    };

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    fn policy() -> InternetServiceEntity {
        let now = Utc::now();
        InternetServiceEntity {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            bandwidth_down_kbps: 50_000,
            bandwidth_up_kbps: 10_000,
            auto_soft_limit: Some(5),
            auto_suspend: Some(7),
            quota_limit_mb: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn router() -> RouterEntity {
        RouterEntity {
            id: Uuid::new_v4(),
            name: "edge-01".to_string(),
            host: "192.0.2.10".to_string(),
            api_port: 443,
            username: "api".to_string(),
            password: "api".to_string(),
            status: RouterStatus::Online.to_string(),
            last_check_at: None,
            created_at: Utc::now(),
        }
    }

    fn provisioning(router_id: Uuid) -> ProvisioningEntity {
        let now = Utc::now();
        ProvisioningEntity {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            router_id,
            pppoe_username: "sub-aabbccdd".to_string(),
            pppoe_password: "s3cr3ts3cr3t".to_string(),
            ip_address: None,
            queue_name: Some("queue-sub-aabbccdd".to_string()),
            status: ProvisioningStatus::Active.to_string(),
            last_ping_at: None,
            ping_latency_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn invoice() -> InvoiceEntity {
        InvoiceEntity {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            invoice_number: "INV-0042".to_string(),
            amount_minor: 19_900,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            status: InvoiceStatus::Overdue.to_string(),
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    fn reminder_action(invoice: InvoiceEntity) -> ReminderAction {
        let idempotency_key = reminder_idempotency_key(
            invoice.id,
            ReminderStage::HPlus1,
            ReminderChannel::Email,
        );
        ReminderAction {
            invoice,
            stage: ReminderStage::HPlus1,
            channel: ReminderChannel::Email,
            idempotency_key,
        }
    }

    #[tokio::test]
    async fn transition_pushes_to_router_then_updates_db() {
        let router = router();
        let provisioning = provisioning(router.id);
        let provisioning_id = provisioning.id;
        let policy = policy();

        let mut repo = MockBillingSweepRepository::new();
        let policy_clone = policy.clone();
        repo.expect_find_service_policy()
            .returning(move |_| {
                let policy = policy_clone.clone();
                Box::pin(async move { Ok(Some(policy)) })
            });
        let router_clone = router.clone();
        repo.expect_find_router().returning(move |_| {
            let router = router_clone.clone();
            Box::pin(async move { Ok(Some(router)) })
        });
        repo.expect_update_provisioning_status()
            .withf(move |id, status| {
                *id == provisioning_id && *status == ProvisioningStatus::SoftLimited
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut router_client = MockRouterClient::new();
        router_client
            .expect_apply_provisioning_state()
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(router_client),
            Arc::new(MockNotificationClient::new()),
            fast_retry(),
        );

        let action = SweepAction::Provision(ProvisionAction {
            subscription_id: provisioning.subscription_id,
            product_id: policy.product_id,
            target: ProvisioningStatus::SoftLimited,
            kind: ProvisionActionKind::Transition { provisioning },
        });

        executor.execute(action, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn transient_router_errors_exhaust_the_retry_budget() {
        let router = router();
        let provisioning = provisioning(router.id);
        let policy = policy();

        let mut repo = MockBillingSweepRepository::new();
        let policy_clone = policy.clone();
        repo.expect_find_service_policy()
            .returning(move |_| {
                let policy = policy_clone.clone();
                Box::pin(async move { Ok(Some(policy)) })
            });
        let router_clone = router.clone();
        repo.expect_find_router().returning(move |_| {
            let router = router_clone.clone();
            Box::pin(async move { Ok(Some(router)) })
        });
        // The DB row must keep the real state when the router never accepted
        // the change.
        repo.expect_update_provisioning_status().times(0);

        let mut router_client = MockRouterClient::new();
        router_client
            .expect_apply_provisioning_state()
            .times(3)
            .returning(|_, _, _, _| {
                Box::pin(async { Err(CollaboratorError::retryable("router unreachable")) })
            });

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(router_client),
            Arc::new(MockNotificationClient::new()),
            fast_retry(),
        );

        let action = SweepAction::Provision(ProvisionAction {
            subscription_id: provisioning.subscription_id,
            product_id: policy.product_id,
            target: ProvisioningStatus::Suspended,
            kind: ProvisionActionKind::Transition { provisioning },
        });

        assert!(executor.execute(action, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn permanent_router_errors_are_not_retried() {
        let router = router();
        let provisioning = provisioning(router.id);
        let policy = policy();

        let mut repo = MockBillingSweepRepository::new();
        let policy_clone = policy.clone();
        repo.expect_find_service_policy()
            .returning(move |_| {
                let policy = policy_clone.clone();
                Box::pin(async move { Ok(Some(policy)) })
            });
        let router_clone = router.clone();
        repo.expect_find_router().returning(move |_| {
            let router = router_clone.clone();
            Box::pin(async move { Ok(Some(router)) })
        });
        repo.expect_update_provisioning_status().times(0);

        let mut router_client = MockRouterClient::new();
        router_client
            .expect_apply_provisioning_state()
            .times(1)
            .returning(|_, _, _, _| {
                Box::pin(async { Err(CollaboratorError::permanent("invalid credentials")) })
            });

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(router_client),
            Arc::new(MockNotificationClient::new()),
            fast_retry(),
        );

        let action = SweepAction::Provision(ProvisionAction {
            subscription_id: provisioning.subscription_id,
            product_id: policy.product_id,
            target: ProvisioningStatus::Suspended,
            kind: ProvisionActionKind::Transition { provisioning },
        });

        assert!(executor.execute(action, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn reminder_claims_key_then_sends() {
        let action = reminder_action(invoice());
        let expected_key = action.idempotency_key.clone();

        let mut repo = MockBillingSweepRepository::new();
        repo.expect_insert_reminder_if_absent()
            .withf(move |row| row.idempotency_key == expected_key)
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));

        let mut notification_client = MockNotificationClient::new();
        notification_client
            .expect_send()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(MockRouterClient::new()),
            Arc::new(notification_client),
            fast_retry(),
        );

        executor
            .execute(SweepAction::Remind(action), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrent_claim_conflict_is_success_without_a_send() {
        let action = reminder_action(invoice());

        let mut repo = MockBillingSweepRepository::new();
        repo.expect_insert_reminder_if_absent()
            .times(1)
            .returning(|_| Box::pin(async { Ok(false) }));

        let mut notification_client = MockNotificationClient::new();
        notification_client.expect_send().times(0);

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(MockRouterClient::new()),
            Arc::new(notification_client),
            fast_retry(),
        );

        executor
            .execute(SweepAction::Remind(action), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn exhausted_reminder_sends_mark_the_row_failed() {
        let action = reminder_action(invoice());
        let expected_key = action.idempotency_key.clone();

        let mut repo = MockBillingSweepRepository::new();
        repo.expect_insert_reminder_if_absent()
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));
        repo.expect_mark_reminder_failed()
            .withf(move |key, _| key == expected_key)
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let mut notification_client = MockNotificationClient::new();
        notification_client
            .expect_send()
            .times(3)
            .returning(|_, _, _| {
                Box::pin(async { Err(CollaboratorError::retryable("gateway timeout")) })
            });

        let executor = ActionExecutor::new(
            Arc::new(repo),
            Arc::new(MockRouterClient::new()),
            Arc::new(notification_client),
            fast_retry(),
        );

        assert!(
            executor
                .execute(SweepAction::Remind(action), Utc::now())
                .await
                .is_err()
        );
    }

    #[test]
    fn generated_credentials_are_derived_from_the_subscription() {
        let subscription_id = Uuid::new_v4();
        let router_id = Uuid::new_v4();
        let first = build_provisioning(subscription_id, router_id);
        let second = build_provisioning(subscription_id, router_id);

        assert_eq!(first.pppoe_username, second.pppoe_username);
        assert_eq!(first.pppoe_password.len(), 16);
        // Passwords are random per provisioning attempt.
        assert_ne!(first.pppoe_password, second.pppoe_password);
    }
}
