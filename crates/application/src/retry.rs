use std::time::Duration;

/// Bounded retry budget with exponential backoff, shared by every
/// collaborator-facing action.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 15_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff after the given 1-based attempt: `base * 2^(attempt - 1)`,
    /// capped at `backoff_max_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = 2u64.saturating_pow(exponent);
        let base = self.backoff_base_ms.saturating_mul(multiplier);
        Duration::from_millis(base.min(self.backoff_max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff_base_ms: 500,
            backoff_max_ms: 15_000,
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2_000));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            backoff_base_ms: 500,
            backoff_max_ms: 4_000,
        };

        assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(4_000));
    }
}
