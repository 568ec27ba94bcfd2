use std::time::Duration;

/// What happens to offloaded work that runs longer than expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Work runs to completion, however long it takes.
    #[default]
    None,
    /// Work still running after the limit is dropped. Pending completions
    /// are released without being called.
    Cancel(Duration),
    /// Work runs to completion; finishing past the limit logs a warning.
    Warn(Duration),
}

/// Settings of an [`OffloadManager`](super::OffloadManager).
#[derive(Debug, Clone, Default)]
pub struct OffloadConfig {
    /// Handling of work that overruns, [`TimeoutPolicy::None`] by default.
    pub timeout_policy: TimeoutPolicy,
}

impl OffloadConfig {
    /// Starts from the defaults.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    config: OffloadConfig,
}

impl OffloadConfigBuilder {
    /// Sets the [`TimeoutPolicy`].
    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.config.timeout_policy = policy;
        self
    }

    /// Shorthand for [`TimeoutPolicy::Cancel`].
    pub fn timeout(self, limit: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(limit))
    }

    /// Finishes the config.
    pub fn build(self) -> OffloadConfig {
        self.config
    }
}
