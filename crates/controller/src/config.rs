use std::time::Duration;

use safety::{ConfigError, SafetyConfig};
use serde::{Deserialize, Serialize};

use crate::encode::PayloadLayout;

/// Everything fixed at startup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub safety: SafetyConfig,
    /// Delay between ticks. Zero means free-running.
    pub tick_period_ms: u64,
    pub payload_layout: PayloadLayout,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            safety: SafetyConfig::default(),
            tick_period_ms: 100,
            payload_layout: PayloadLayout::default(),
        }
    }
}

impl ControllerConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.safety.validate()
    }
}
