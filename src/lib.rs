//! Dual-channel accelerator pedal sensor fail-safe.
//!
//! Re-exports the `safety`, `controller` and `sim` crates so the scenario
//! tests (and anything embedding the whole stack) can depend on one crate.

pub use controller::*;
pub use safety::*;
pub use sim::*;
