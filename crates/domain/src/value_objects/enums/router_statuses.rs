use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouterStatus {
    Online,
    Offline,
    Error,
}

impl RouterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterStatus::Online => "online",
            RouterStatus::Offline => "offline",
            RouterStatus::Error => "error",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "online" => RouterStatus::Online,
            "error" => RouterStatus::Error,
            _ => RouterStatus::Offline,
        }
    }
}

impl Display for RouterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
