use serde::{Deserialize, Serialize};

use crate::config::OperatingRange;

/// Map a raw sample linearly onto its operating range and clamp to [0, 100].
///
/// Samples outside the range still give a bounded percentage; detecting them
/// is [`check_range`](crate::check_range)'s job. A range with `low == high`
/// is rejected by [`SafetyConfig::validate`](crate::SafetyConfig::validate)
/// and must not reach this function.
pub fn normalize(raw: u16, range: &OperatingRange) -> f64 {
    let span = f64::from(range.high) - f64::from(range.low);
    let pct = (f64::from(raw) - f64::from(range.low)) * 100.0 / span;
    pct.clamp(0.0, 100.0)
}

/// Both channels as percentages plus their mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrottleReading {
    pub channel_one_pct: f64,
    pub channel_two_pct: f64,
    pub average_pct: f64,
}

impl ThrottleReading {
    pub fn from_samples(samples: [u16; 2], ranges: &[OperatingRange; 2]) -> Self {
        let channel_one_pct = normalize(samples[0], &ranges[0]);
        let channel_two_pct = normalize(samples[1], &ranges[1]);
        Self {
            channel_one_pct,
            channel_two_pct,
            average_pct: (channel_one_pct + channel_two_pct) / 2.0,
        }
    }

    /// Absolute disagreement between the channels in percentage points.
    pub fn spread_pct(&self) -> f64 {
        (self.channel_one_pct - self.channel_two_pct).abs()
    }
}
