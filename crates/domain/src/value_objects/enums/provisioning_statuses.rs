use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Network-side state of a subscription's PPPoE session/queue on a router.
/// Only the reconciler transitions this; operators act through subscription
/// status instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProvisioningStatus {
    Active,
    SoftLimited,
    Suspended,
    Terminated,
}

impl ProvisioningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStatus::Active => "active",
            ProvisioningStatus::SoftLimited => "soft_limited",
            ProvisioningStatus::Suspended => "suspended",
            ProvisioningStatus::Terminated => "terminated",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "soft_limited" => ProvisioningStatus::SoftLimited,
            "suspended" => ProvisioningStatus::Suspended,
            "terminated" => ProvisioningStatus::Terminated,
            _ => ProvisioningStatus::Active,
        }
    }
}

impl Display for ProvisioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
