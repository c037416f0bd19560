use serde::{Deserialize, Serialize};

use crate::debounce::DebouncePolicy;
use crate::error::ConfigError;

/// Largest sample a 10-bit converter can produce.
pub const ADC_MAX: u16 = 1023;

/// Inclusive ADC bounds for one sensor channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingRange {
    pub low: u16,
    pub high: u16,
}

impl OperatingRange {
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, raw: u16) -> bool {
        raw >= self.low && raw <= self.high
    }

    /// Width of the range in ADC counts.
    pub fn span(&self) -> u16 {
        self.high.saturating_sub(self.low)
    }

    fn validate(&self, channel: usize) -> Result<(), ConfigError> {
        if self.low >= self.high {
            return Err(ConfigError::DegenerateRange {
                channel,
                low: self.low,
                high: self.high,
            });
        }
        if self.high > ADC_MAX {
            return Err(ConfigError::RangeBeyondAdc {
                channel,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Fault detection parameters, fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Operating range of channel one and channel two.
    pub ranges: [OperatingRange; 2],
    /// Maximum allowed |p1 - p2| in percentage points.
    pub diff_threshold_pct: f64,
    /// Plausibility is only enforced while the average is above this.
    pub min_activation_pct: f64,
    pub debounce: DebouncePolicy,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            ranges: [OperatingRange::new(102, 718), OperatingRange::new(205, 820)],
            diff_threshold_pct: 10.0,
            min_activation_pct: 10.0,
            debounce: DebouncePolicy::default(),
        }
    }
}

impl SafetyConfig {
    /// Check the startup contract. Nothing downstream re-checks these.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (channel, range) in self.ranges.iter().enumerate() {
            range.validate(channel + 1)?;
        }
        if !self.diff_threshold_pct.is_finite() || self.diff_threshold_pct < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "diff_threshold_pct",
                value: self.diff_threshold_pct,
            });
        }
        if !self.min_activation_pct.is_finite() || self.min_activation_pct < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "min_activation_pct",
                value: self.min_activation_pct,
            });
        }
        if self.debounce.trip_after == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }
}
