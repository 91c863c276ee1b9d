use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    entities::{
        internet_services::InternetServiceEntity, invoices::InvoiceEntity,
        provisionings::ProvisioningEntity, reminders::ReminderEntity,
        subscriptions::SubscriptionEntity,
    },
    repositories::billing_sweep::BillingSweepRepository,
    value_objects::{
        enums::{
            reminder_channels::ReminderChannel, subscription_statuses::SubscriptionStatus,
        },
        sweep_actions::SweepAction,
        sweep_reports::SweepReport,
    },
};
use futures_util::{StreamExt, stream};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    action_executor::ActionExecutor,
    reconciler::{self, ReconcileInput},
    reminder_scheduler,
};

#[derive(Debug, Clone, Copy)]
pub struct SweepParams {
    pub now: DateTime<Utc>,
    pub dry_run: bool,
    pub limit: Option<i64>,
    /// Soft deadline: subscriptions not yet started when it passes are
    /// skipped and picked up by the next sweep.
    pub deadline: Option<Duration>,
}

impl SweepParams {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            dry_run: false,
            limit: None,
            deadline: None,
        }
    }
}

struct SubscriptionSnapshot {
    subscription: SubscriptionEntity,
    policy: InternetServiceEntity,
    invoice: Option<InvoiceEntity>,
    provisioning: Option<ProvisioningEntity>,
    reminders: Vec<ReminderEntity>,
}

enum SubscriptionOutcome {
    Processed {
        subscription_id: Uuid,
        attempted: usize,
        succeeded: usize,
        failed: usize,
    },
    Skipped {
        subscription_id: Uuid,
    },
}

/// One full pass over the due subscriptions: reconcile provisioning state,
/// schedule reminders, execute the resulting actions, aggregate a report.
/// Failures stay scoped to their subscription; the sweep itself only fails
/// when the candidate list cannot be loaded at all.
pub struct BillingSweepUseCase {
    repository: Arc<dyn BillingSweepRepository + Send + Sync>,
    executor: Arc<ActionExecutor>,
    channels: Vec<ReminderChannel>,
    concurrency: usize,
}

impl BillingSweepUseCase {
    pub fn new(
        repository: Arc<dyn BillingSweepRepository + Send + Sync>,
        executor: Arc<ActionExecutor>,
        channels: Vec<ReminderChannel>,
        concurrency: usize,
    ) -> Self {
        Self {
            repository,
            executor,
            channels,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, params: SweepParams) -> Result<SweepReport> {
        let today = params.now.date_naive();
        let started = Instant::now();

        let mut report = SweepReport::default();

        match self.repository.mark_overdue_invoices(today).await {
            Ok(count) => report.invoices_marked_overdue = count,
            // The reconciler works from due dates, not the status label, so
            // a failed flip degrades bookkeeping only.
            Err(err) => warn!(error = %err, "billing_sweep: overdue flip failed"),
        }

        let subscriptions = self.repository.list_due_subscriptions(params.limit).await?;
        report.subscriptions_scanned = subscriptions.len();

        let outcomes = stream::iter(subscriptions.into_iter().map(|subscription| {
            let deadline = params.deadline;
            async move {
                if let Some(deadline) = deadline {
                    if started.elapsed() >= deadline {
                        warn!(
                            subscription_id = %subscription.id,
                            "billing_sweep: deadline reached; deferring to next sweep"
                        );
                        return SubscriptionOutcome::Skipped {
                            subscription_id: subscription.id,
                        };
                    }
                }
                self.process_subscription(subscription, today, params).await
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect::<Vec<_>>()
        .await;

        for outcome in outcomes {
            match outcome {
                SubscriptionOutcome::Processed {
                    subscription_id,
                    attempted,
                    succeeded,
                    failed,
                } => {
                    report.actions_attempted += attempted;
                    report.actions_succeeded += succeeded;
                    report.actions_failed += failed;
                    if failed > 0 {
                        report.record_failed_subscription(subscription_id);
                    }
                }
                SubscriptionOutcome::Skipped { subscription_id } => {
                    report.record_skipped_subscription(subscription_id);
                }
            }
        }

        info!(
            subscriptions_scanned = report.subscriptions_scanned,
            subscriptions_skipped = report.subscriptions_skipped,
            invoices_marked_overdue = report.invoices_marked_overdue,
            actions_attempted = report.actions_attempted,
            actions_succeeded = report.actions_succeeded,
            actions_failed = report.actions_failed,
            dry_run = params.dry_run,
            "billing_sweep: completed"
        );

        Ok(report)
    }

    async fn process_subscription(
        &self,
        subscription: SubscriptionEntity,
        today: NaiveDate,
        params: SweepParams,
    ) -> SubscriptionOutcome {
        let subscription_id = subscription.id;
        let snapshot = match self.load_snapshot(subscription).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                warn!(
                    %subscription_id,
                    "billing_sweep: service policy missing; skipping subscription"
                );
                return SubscriptionOutcome::Skipped { subscription_id };
            }
            Err(err) => {
                error!(
                    %subscription_id,
                    db_error = %err,
                    "billing_sweep: failed to load subscription snapshot"
                );
                return SubscriptionOutcome::Skipped { subscription_id };
            }
        };

        let actions = self.plan_actions(&snapshot, today);
        if params.dry_run {
            info!(
                %subscription_id,
                planned_actions = actions.len(),
                "billing_sweep: dry run; not executing"
            );
            return SubscriptionOutcome::Processed {
                subscription_id,
                attempted: actions.len(),
                succeeded: 0,
                failed: 0,
            };
        }

        let mut attempted = 0;
        let mut succeeded = 0;
        let mut failed = 0;
        for action in actions {
            attempted += 1;
            match self.executor.execute(action, params.now).await {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    failed += 1;
                    error!(
                        %subscription_id,
                        error = %err,
                        "billing_sweep: action failed"
                    );
                }
            }
        }

        SubscriptionOutcome::Processed {
            subscription_id,
            attempted,
            succeeded,
            failed,
        }
    }

    async fn load_snapshot(
        &self,
        subscription: SubscriptionEntity,
    ) -> Result<Option<SubscriptionSnapshot>> {
        let Some(policy) = self
            .repository
            .find_service_policy(subscription.product_id)
            .await?
        else {
            return Ok(None);
        };

        let invoice = self.repository.find_governing_invoice(subscription.id).await?;
        let provisioning = self.repository.find_provisioning(subscription.id).await?;
        let reminders = match invoice.as_ref() {
            Some(invoice) => self.repository.list_reminders(invoice.id).await?,
            None => Vec::new(),
        };

        Ok(Some(SubscriptionSnapshot {
            subscription,
            policy,
            invoice,
            provisioning,
            reminders,
        }))
    }

    fn plan_actions(&self, snapshot: &SubscriptionSnapshot, today: NaiveDate) -> Vec<SweepAction> {
        let mut actions = Vec::new();

        let input = ReconcileInput {
            subscription: &snapshot.subscription,
            policy: &snapshot.policy,
            invoice: snapshot.invoice.as_ref(),
            provisioning: snapshot.provisioning.as_ref(),
        };
        if let Some(action) = reconciler::reconcile(&input, today) {
            actions.push(SweepAction::Provision(action));
        }

        // Terminated customers stop getting dunning messages; the teardown
        // action above is the last thing the engine does for them.
        let status = SubscriptionStatus::from_str(&snapshot.subscription.status);
        if status != SubscriptionStatus::Terminated {
            if let Some(invoice) = snapshot.invoice.as_ref() {
                for action in reminder_scheduler::due_reminders(
                    invoice,
                    &snapshot.policy,
                    &snapshot.reminders,
                    &self.channels,
                    today,
                ) {
                    actions.push(SweepAction::Remind(action));
                }
            }
        }

        actions
    }
}
