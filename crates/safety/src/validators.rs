use crate::config::SafetyConfig;
use crate::debounce::{FaultFlag, Verdict};
use crate::reading::ThrottleReading;

/// Flag either sample outside its channel's operating range.
///
/// A first occurrence only warns; the configured number of consecutive
/// occurrences trips. An in-range cycle clears `flag`.
pub fn check_range(cfg: &SafetyConfig, flag: &mut FaultFlag, samples: [u16; 2]) -> Verdict {
    let out_of_range = !cfg.ranges[0].contains(samples[0]) || !cfg.ranges[1].contains(samples[1]);
    flag.observe(out_of_range, cfg.debounce)
}

/// Flag excessive disagreement between the channels while the pedal is pressed.
///
/// At or below `min_activation_pct` the check is inactive and `flag` is
/// cleared, even if the previous cycle had raised it.
pub fn check_plausibility(
    cfg: &SafetyConfig,
    flag: &mut FaultFlag,
    reading: &ThrottleReading,
) -> Verdict {
    let enforced = reading.average_pct > cfg.min_activation_pct;
    let disagree = enforced && reading.spread_pct() > cfg.diff_threshold_pct;
    flag.observe(disagree, cfg.debounce)
}
