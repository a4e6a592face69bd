//! Per-call engine configuration.

/// Configuration for one match/find invocation.
///
/// The step budget is the engine's only hard resource bound: every
/// dispatch counts one step, and exhausting the budget ends the
/// enumeration with a terminal error record on the stream instead of a
/// panic.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchConfig {
    /// Maximum number of engine steps, or `None` for unbounded.
    pub step_budget: Option<u64>,
}

impl MatchConfig {
    /// Unbounded configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total work of the invocation.
    pub fn with_step_budget(budget: u64) -> Self {
        Self {
            step_budget: Some(budget),
        }
    }
}
