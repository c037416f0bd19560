//! Throttle control cycle for a dual-channel pedal sensor.
//!
//! [`ControlCycle`] runs one evaluation per tick: normalize both channels,
//! check range then plausibility, and either encode the throttle payload or
//! emit the failure frame. Transmission goes through [`FrameSink`].

#![deny(clippy::unwrap_used)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

mod config;
mod cycle;
mod encode;
mod frame;

pub use config::ControllerConfig;
pub use cycle::{ControlCycle, CycleError, Diagnostics, Output, Tick};
pub use encode::{encode, PayloadLayout, ThrottlePayload};
pub use frame::{CanFrame, FrameSink, FAILURE_FRAME_ID, THROTTLE_FRAME_ID};
