//! Migration policy configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded fixed-delay polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Status reads before giving up
    pub max_attempts: u32,
    /// Delay before every read; no backoff, no jitter
    pub delay: Duration,
}

impl PollPolicy {
    /// Create a poll policy
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// How a single Config Server instance is migrated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPolicy {
    /// Appended to the original name while the old instance is kept around
    pub old_name_suffix: String,
    /// Polling of the asynchronous rename
    pub rename_poll: PollPolicy,
    /// Delete the old instance once every app has been rebound
    pub delete_old_instance: bool,
}

impl MigrationPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With rename poll policy
    #[inline]
    #[must_use]
    pub fn with_rename_poll(mut self, poll: PollPolicy) -> Self {
        self.rename_poll = poll;
        self
    }

    /// With old instance deletion
    #[inline]
    #[must_use]
    pub fn with_delete_old_instance(mut self, delete: bool) -> Self {
        self.delete_old_instance = delete;
        self
    }

    /// Name the existing instance is renamed to
    #[inline]
    #[must_use]
    pub fn old_name(&self, name: &str) -> String {
        format!("{name}{}", self.old_name_suffix)
    }
}

impl Default for MigrationPolicy {
    fn default() -> Self {
        Self {
            old_name_suffix: "-old".to_string(),
            rename_poll: PollPolicy::default(),
            delete_old_instance: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = MigrationPolicy::new();
        assert_eq!(policy.rename_poll.max_attempts, 3);
        assert_eq!(policy.rename_poll.delay, Duration::from_secs(1));
        assert!(!policy.delete_old_instance);
        assert_eq!(policy.old_name("config"), "config-old");
    }

    #[test]
    fn builder() {
        let policy = MigrationPolicy::new()
            .with_rename_poll(PollPolicy::new(5, Duration::ZERO))
            .with_delete_old_instance(true);
        assert_eq!(policy.rename_poll.max_attempts, 5);
        assert!(policy.delete_old_instance);
    }
}
