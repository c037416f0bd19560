use core::fmt;

use serde::{Deserialize, Serialize};

/// Which check escalated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// A sample left its channel's operating range.
    Range,
    /// The two channels disagreed while the pedal was pressed.
    Plausibility,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Range => write!(f, "sensor out of operating range"),
            FaultKind::Plausibility => write!(f, "sensor channels disagree"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemState {
    #[default]
    Normal,
    Failed,
}

/// One-way latch from [`SystemState::Normal`] to [`SystemState::Failed`].
///
/// There is no reset. Recovery means constructing a new latch, i.e. a restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FailSafeLatch {
    reason: Option<FaultKind>,
}

impl FailSafeLatch {
    pub fn state(&self) -> SystemState {
        match self.reason {
            Some(_) => SystemState::Failed,
            None => SystemState::Normal,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.reason.is_some()
    }

    /// The fault that set the latch, if any.
    pub fn reason(&self) -> Option<FaultKind> {
        self.reason
    }

    /// Set the latch. Returns `true` only on the `Normal -> Failed` transition;
    /// later calls keep the first reason.
    pub fn trip(&mut self, kind: FaultKind) -> bool {
        if self.reason.is_some() {
            return false;
        }
        self.reason = Some(kind);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_normal() {
        let latch = FailSafeLatch::default();
        assert_eq!(latch.state(), SystemState::Normal);
        assert_eq!(latch.reason(), None);
    }

    #[test]
    fn trip_is_idempotent_and_keeps_first_reason() {
        let mut latch = FailSafeLatch::default();
        assert!(latch.trip(FaultKind::Plausibility));
        assert!(!latch.trip(FaultKind::Range));
        assert!(!latch.trip(FaultKind::Plausibility));
        assert_eq!(latch.state(), SystemState::Failed);
        assert_eq!(latch.reason(), Some(FaultKind::Plausibility));
    }

    #[test]
    fn display() {
        assert_eq!(FaultKind::Range.to_string(), "sensor out of operating range");
        assert_eq!(
            FaultKind::Plausibility.to_string(),
            "sensor channels disagree"
        );
    }

    proptest::proptest! {
        #[test]
        fn once_failed_always_failed(kinds in proptest::collection::vec(proptest::bool::ANY, 1..20)) {
            let mut latch = FailSafeLatch::default();
            let mut first = None;
            for range in kinds {
                let kind = if range { FaultKind::Range } else { FaultKind::Plausibility };
                if first.is_none() {
                    first = Some(kind);
                }
                latch.trip(kind);
                proptest::prop_assert_eq!(latch.state(), SystemState::Failed);
            }
            proptest::prop_assert_eq!(latch.reason(), first);
        }
    }
}
