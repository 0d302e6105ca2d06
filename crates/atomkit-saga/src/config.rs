use std::time::Duration;

use atomkit_store::DEFAULT_ID_FIELD;

/// Upper bound on a single store call unless configured otherwise.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when the snapshot needed for an inverse cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreparationPolicy {
    /// Log the failure and run the operation without an inverse.
    #[default]
    BestEffort,
    /// Fail the run before the operation executes.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    call_timeout: Option<Duration>,
    preparation_policy: PreparationPolicy,
    id_field: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            preparation_policy: PreparationPolicy::default(),
            id_field: String::from(DEFAULT_ID_FIELD),
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    #[must_use]
    pub fn preparation_policy(&self) -> PreparationPolicy {
        self.preparation_policy
    }

    /// Field holding the primary key of stored records.
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// `None` lets a store call run for as long as it takes.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    #[must_use]
    pub fn with_preparation_policy(mut self, policy: PreparationPolicy) -> Self {
        self.preparation_policy = policy;
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }
}
