/// Default arena capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4000;

/// What a replay pass does when a callback invocation reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnFailure {
    /// Keep replaying the remaining records and collect every failure.
    #[default]
    Continue,
    /// Stop at the first failing record.
    Stop,
}

/// Replay settings for a [`DeferredPrintf`](crate::DeferredPrintf).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayPolicy {
    pub on_failure: OnFailure,
}

impl ReplayPolicy {
    pub const fn continue_on_failure() -> Self {
        Self { on_failure: OnFailure::Continue }
    }

    pub const fn stop_on_failure() -> Self {
        Self { on_failure: OnFailure::Stop }
    }
}
