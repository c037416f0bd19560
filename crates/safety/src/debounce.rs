//! Debounce-by-repetition.
//!
//! A fault condition escalates only after it has been observed on
//! `trip_after` strictly consecutive cycles. Any clean cycle forgets it.

use serde::{Deserialize, Serialize};

/// How many consecutive faulty cycles escalate to a trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebouncePolicy {
    pub trip_after: u8,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self { trip_after: 2 }
    }
}

/// Outcome of one validator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Condition absent this cycle.
    Clear,
    /// Condition present but not yet repeated enough to escalate.
    Warning,
    /// Condition repeated on enough consecutive cycles.
    Trip,
}

impl Verdict {
    pub fn is_trip(self) -> bool {
        self == Verdict::Trip
    }
}

/// Memory of a fault condition across cycles.
///
/// Holds the number of consecutive cycles the condition has been seen. With
/// the default policy this is the "seen on the previous cycle" flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultFlag {
    consecutive: u8,
}

impl FaultFlag {
    /// A flag that saw its condition on the previous cycle.
    pub const fn raised() -> Self {
        Self { consecutive: 1 }
    }

    /// True when the previous cycle observed the condition.
    pub fn is_set(&self) -> bool {
        self.consecutive > 0
    }

    pub fn consecutive(&self) -> u8 {
        self.consecutive
    }

    /// Record this cycle's condition and decide whether it escalates.
    ///
    /// Once tripped the count is held, not reset.
    pub fn observe(&mut self, condition: bool, policy: DebouncePolicy) -> Verdict {
        if !condition {
            self.consecutive = 0;
            return Verdict::Clear;
        }

        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= policy.trip_after.max(1) {
            Verdict::Trip
        } else {
            Verdict::Warning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_trips_on_second_consecutive() {
        let policy = DebouncePolicy::default();
        let mut flag = FaultFlag::default();

        assert_eq!(flag.observe(true, policy), Verdict::Warning);
        assert!(flag.is_set());
        assert_eq!(flag.observe(true, policy), Verdict::Trip);
        assert!(flag.is_set());
    }

    #[test]
    fn clean_cycle_resets_memory() {
        let policy = DebouncePolicy::default();
        let mut flag = FaultFlag::default();

        for _ in 0..10 {
            assert_eq!(flag.observe(true, policy), Verdict::Warning);
            assert_eq!(flag.observe(false, policy), Verdict::Clear);
            assert!(!flag.is_set());
        }
    }

    #[test]
    fn deeper_policy_needs_more_repeats() {
        let policy = DebouncePolicy { trip_after: 3 };
        let mut flag = FaultFlag::default();

        assert_eq!(flag.observe(true, policy), Verdict::Warning);
        assert_eq!(flag.observe(true, policy), Verdict::Warning);
        assert_eq!(flag.observe(true, policy), Verdict::Trip);
        assert_eq!(flag.consecutive(), 3);
    }

    #[test]
    fn single_cycle_policy_trips_immediately() {
        let mut flag = FaultFlag::default();
        assert_eq!(
            flag.observe(true, DebouncePolicy { trip_after: 1 }),
            Verdict::Trip
        );
    }

    #[test]
    fn raised_flag_trips_on_next_occurrence() {
        let mut flag = FaultFlag::raised();
        assert_eq!(flag.observe(true, DebouncePolicy::default()), Verdict::Trip);
    }
}
