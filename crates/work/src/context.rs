//! Shared settings and time source for the work services.

use std::sync::Arc;
use shifttrack_core::{Clock, SystemClock};
use shifttrack_progress::MasteryPolicy;

/// Tunables for the work services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkConfig {
    /// Active goals allowed per employee
    pub max_active_goals: usize,

    /// Days from start to target date for custom goals without one
    pub default_target_days: u32,

    /// Mastery thresholds handed to the progression engine
    pub policy: MasteryPolicy,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            max_active_goals: 2,
            default_target_days: 90,
            policy: MasteryPolicy::default(),
        }
    }
}

/// Configuration plus clock, cloned into each service.
#[derive(Clone)]
pub struct WorkContext {
    /// Service settings
    pub config: WorkConfig,

    /// Source of "now" and "today"
    pub clock: Arc<dyn Clock>,
}

impl Default for WorkContext {
    fn default() -> Self {
        Self {
            config: WorkConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl WorkContext {
    /// Create a context with default settings and the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config.
    pub fn with_config(mut self, config: WorkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for WorkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkContext")
            .field("config", &self.config)
            .field("now", &self.clock.now())
            .finish()
    }
}
