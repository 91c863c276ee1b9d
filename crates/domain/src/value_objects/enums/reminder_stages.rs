use std::fmt::Display;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::internet_services::InternetServiceEntity;

/// Dunning stages relative to an invoice due date. The `h_minus_*` stages
/// warn before the due date, `h_plus_1` right after it, and the `pre_*`
/// stages one day before the automatic soft-limit / suspension thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReminderStage {
    HMinus7,
    HMinus3,
    HMinus1,
    HPlus1,
    PreSoftLimit,
    PreSuspend,
}

impl ReminderStage {
    pub const ALL: [ReminderStage; 6] = [
        ReminderStage::HMinus7,
        ReminderStage::HMinus3,
        ReminderStage::HMinus1,
        ReminderStage::HPlus1,
        ReminderStage::PreSoftLimit,
        ReminderStage::PreSuspend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStage::HMinus7 => "h_minus_7",
            ReminderStage::HMinus3 => "h_minus_3",
            ReminderStage::HMinus1 => "h_minus_1",
            ReminderStage::HPlus1 => "h_plus_1",
            ReminderStage::PreSoftLimit => "pre_soft_limit",
            ReminderStage::PreSuspend => "pre_suspend",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "h_minus_7" => Some(ReminderStage::HMinus7),
            "h_minus_3" => Some(ReminderStage::HMinus3),
            "h_minus_1" => Some(ReminderStage::HMinus1),
            "h_plus_1" => Some(ReminderStage::HPlus1),
            "pre_soft_limit" => Some(ReminderStage::PreSoftLimit),
            "pre_suspend" => Some(ReminderStage::PreSuspend),
            _ => None,
        }
    }

    /// The first calendar day this stage is due for an invoice, or `None`
    /// when the stage depends on a threshold the service policy does not set.
    pub fn due_on(&self, due_date: NaiveDate, policy: &InternetServiceEntity) -> Option<NaiveDate> {
        let offset_days = match self {
            ReminderStage::HMinus7 => -7,
            ReminderStage::HMinus3 => -3,
            ReminderStage::HMinus1 => -1,
            ReminderStage::HPlus1 => 1,
            ReminderStage::PreSoftLimit => i64::from(policy.auto_soft_limit?) - 1,
            ReminderStage::PreSuspend => i64::from(policy.auto_suspend?) - 1,
        };
        due_date.checked_add_signed(Duration::days(offset_days))
    }
}

impl Display for ReminderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn policy(soft: Option<i32>, suspend: Option<i32>) -> InternetServiceEntity {
        let now = Utc::now();
        InternetServiceEntity {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            bandwidth_down_kbps: 20_000,
            bandwidth_up_kbps: 5_000,
            auto_soft_limit: soft,
            auto_suspend: suspend,
            quota_limit_mb: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fixed_stages_are_offset_from_due_date() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let policy = policy(Some(5), Some(7));

        assert_eq!(
            ReminderStage::HMinus7.due_on(due, &policy),
            NaiveDate::from_ymd_opt(2026, 3, 3)
        );
        assert_eq!(
            ReminderStage::HMinus1.due_on(due, &policy),
            NaiveDate::from_ymd_opt(2026, 3, 9)
        );
        assert_eq!(
            ReminderStage::HPlus1.due_on(due, &policy),
            NaiveDate::from_ymd_opt(2026, 3, 11)
        );
    }

    #[test]
    fn threshold_stages_land_one_day_before_the_threshold() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let policy = policy(Some(5), Some(7));

        assert_eq!(
            ReminderStage::PreSoftLimit.due_on(due, &policy),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
        assert_eq!(
            ReminderStage::PreSuspend.due_on(due, &policy),
            NaiveDate::from_ymd_opt(2026, 3, 16)
        );
    }

    #[test]
    fn threshold_stages_are_disabled_without_a_threshold() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let policy = policy(None, None);

        assert_eq!(ReminderStage::PreSoftLimit.due_on(due, &policy), None);
        assert_eq!(ReminderStage::PreSuspend.due_on(due, &policy), None);
    }

    #[test]
    fn stage_names_round_trip() {
        for stage in ReminderStage::ALL {
            assert_eq!(ReminderStage::from_str(stage.as_str()), Some(stage));
        }
    }
}
