use serde::Serialize;
use uuid::Uuid;

const ID_SAMPLE_LIMIT: usize = 20;

/// Outcome of one full sweep. Failures are counted per action and per
/// subscription; id lists are capped samples for operators, not exhaustive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub subscriptions_scanned: usize,
    pub subscriptions_skipped: usize,
    pub invoices_marked_overdue: usize,
    pub actions_attempted: usize,
    pub actions_succeeded: usize,
    pub actions_failed: usize,
    pub failed_subscription_ids: Vec<Uuid>,
    pub skipped_subscription_ids: Vec<Uuid>,
}

impl SweepReport {
    pub fn record_failed_subscription(&mut self, subscription_id: Uuid) {
        if self.failed_subscription_ids.len() < ID_SAMPLE_LIMIT {
            self.failed_subscription_ids.push(subscription_id);
        }
    }

    pub fn record_skipped_subscription(&mut self, subscription_id: Uuid) {
        self.subscriptions_skipped += 1;
        if self.skipped_subscription_ids.len() < ID_SAMPLE_LIMIT {
            self.skipped_subscription_ids.push(subscription_id);
        }
    }
}
