//! Fault detection and fail-safe latching for a dual-channel accelerator pedal
//! position sensor (APPS).
//!
//! Each cycle the two raw ADC samples are normalized into a [`ThrottleReading`],
//! then checked for range violations and for channel disagreement. Either fault
//! on two consecutive cycles trips the [`FailSafeLatch`], which never clears.
//!
//! ```text
//! ┌─────────────┐  range or plausibility trip  ┌─────────────┐
//! │   Normal    │─────────────────────────────▶│   Failed    │
//! └─────────────┘                              └─────────────┘
//! ```
//!
//! All state lives in [`SafetyState`], owned by the caller and passed into each
//! call. Nothing here logs; callers read the state back for diagnostics.

#![deny(clippy::unwrap_used)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

mod config;
mod debounce;
mod error;
mod latch;
mod reading;
mod validators;

pub use config::{OperatingRange, SafetyConfig, ADC_MAX};
pub use debounce::{DebouncePolicy, FaultFlag, Verdict};
pub use error::ConfigError;
pub use latch::{FailSafeLatch, FaultKind, SystemState};
pub use reading::{normalize, ThrottleReading};
pub use validators::{check_plausibility, check_range};

/// Mutable safety context for one power-on session.
///
/// A fresh default value is the only way back to [`SystemState::Normal`].
#[derive(Clone, Debug, Default)]
pub struct SafetyState {
    pub range_fault: FaultFlag,
    pub disagreement_fault: FaultFlag,
    pub latch: FailSafeLatch,
}

impl SafetyState {
    pub fn system_state(&self) -> SystemState {
        self.latch.state()
    }

    pub fn is_failed(&self) -> bool {
        self.latch.is_failed()
    }
}

/// What a single call to [`evaluate`] decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// The latch was already set before this cycle; nothing was checked.
    Latched,
    /// A validator escalated on this cycle and the latch was set.
    Tripped(FaultKind),
    /// No escalation. Either verdict may still be a first-occurrence warning.
    Passed { range: Verdict, plausibility: Verdict },
}

impl Evaluation {
    pub fn is_failed(self) -> bool {
        !matches!(self, Evaluation::Passed { .. })
    }
}

/// Evaluate one cycle: range check first, then plausibility.
///
/// A range trip returns before the plausibility check runs, so a cycle that
/// violates both is reported as [`FaultKind::Range`]. Once the latch is set it
/// stays set and later calls return [`Evaluation::Latched`].
pub fn evaluate(
    cfg: &SafetyConfig,
    state: &mut SafetyState,
    samples: [u16; 2],
    reading: &ThrottleReading,
) -> Evaluation {
    if state.is_failed() {
        return Evaluation::Latched;
    }

    let range = check_range(cfg, &mut state.range_fault, samples);
    if range.is_trip() {
        state.latch.trip(FaultKind::Range);
        return Evaluation::Tripped(FaultKind::Range);
    }

    let plausibility = check_plausibility(cfg, &mut state.disagreement_fault, reading);
    if plausibility.is_trip() {
        state.latch.trip(FaultKind::Plausibility);
        return Evaluation::Tripped(FaultKind::Plausibility);
    }

    Evaluation::Passed {
        range,
        plausibility,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(cfg: &SafetyConfig, state: &mut SafetyState, samples: [u16; 2]) -> Evaluation {
        let reading = ThrottleReading::from_samples(samples, &cfg.ranges);
        evaluate(cfg, state, samples, &reading)
    }

    #[test]
    fn out_of_range_twice_trips_and_stays_failed() {
        let cfg = SafetyConfig::default();
        let mut state = SafetyState::default();

        assert_eq!(
            step(&cfg, &mut state, [50, 300]),
            Evaluation::Passed {
                range: Verdict::Warning,
                plausibility: Verdict::Clear,
            }
        );
        assert_eq!(
            step(&cfg, &mut state, [50, 300]),
            Evaluation::Tripped(FaultKind::Range)
        );
        assert_eq!(state.system_state(), SystemState::Failed);
        assert!(state.is_failed());

        for _ in 0..5 {
            assert_eq!(step(&cfg, &mut state, [400, 512]), Evaluation::Latched);
        }
        assert_eq!(state.latch.reason(), Some(FaultKind::Range));
    }

    #[test]
    fn range_takes_priority_over_plausibility() {
        let cfg = SafetyConfig::default();
        let mut state = SafetyState::default();

        // ch1 above its range (100 %), ch2 near the bottom of its range.
        let samples = [800, 250];
        assert!(!step(&cfg, &mut state, samples).is_failed());
        assert_eq!(
            step(&cfg, &mut state, samples),
            Evaluation::Tripped(FaultKind::Range)
        );
    }

    #[test]
    fn range_warning_still_runs_plausibility() {
        let cfg = SafetyConfig::default();
        let mut state = SafetyState::default();

        // ch1 slightly out of range and far from ch2, avg well above the floor.
        let eval = step(&cfg, &mut state, [720, 400]);
        assert_eq!(
            eval,
            Evaluation::Passed {
                range: Verdict::Warning,
                plausibility: Verdict::Warning,
            }
        );
        assert!(state.range_fault.is_set());
        assert!(state.disagreement_fault.is_set());
    }

    #[test]
    fn latched_state_skips_validators() {
        let cfg = SafetyConfig::default();
        let mut state = SafetyState::default();
        state.latch.trip(FaultKind::Plausibility);

        assert_eq!(step(&cfg, &mut state, [50, 50]), Evaluation::Latched);
        assert!(!state.range_fault.is_set());
    }
}
