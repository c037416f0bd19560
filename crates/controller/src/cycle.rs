use safety::{Evaluation, FaultKind, SafetyState, SystemState, ThrottleReading, Verdict};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::encode::{encode, ThrottlePayload};
use crate::frame::{CanFrame, FrameSink};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] safety::ConfigError),

    /// The tick was evaluated and committed; only the send failed.
    #[error("failed to transmit frame 0x{id:02X}")]
    Transmit {
        id: u32,
        tick: Box<Tick>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CycleError {
    /// The tick whose frame could not be sent, if that is what failed.
    pub fn tick(&self) -> Option<&Tick> {
        match self {
            CycleError::Transmit { tick, .. } => Some(tick.as_ref()),
            CycleError::Config(_) => None,
        }
    }
}

/// Read-only snapshot of the last tick, for external logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub state: SystemState,
    pub reason: Option<FaultKind>,
    pub range_fault: bool,
    pub disagreement_fault: bool,
    pub raw: [u16; 2],
    pub channel_one_pct: f64,
    pub channel_two_pct: f64,
    /// Forced to zero once the latch is set.
    pub average_pct: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Throttle(ThrottlePayload),
    /// `newly_tripped` is true only on the tick that set the latch.
    Failure { newly_tripped: bool },
}

impl Output {
    pub fn is_failure(&self) -> bool {
        matches!(self, Output::Failure { .. })
    }

    /// The bus frame for this output.
    pub fn frame(&self) -> CanFrame {
        match self {
            Output::Throttle(payload) => CanFrame::throttle(*payload),
            Output::Failure { .. } => CanFrame::failure(),
        }
    }
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub output: Output,
    pub frame: CanFrame,
    pub diagnostics: Diagnostics,
}

/// One power-on session of the pedal controller.
///
/// Dropping it and building a new one is the only way out of
/// [`SystemState::Failed`].
#[derive(Debug)]
pub struct ControlCycle {
    cfg: ControllerConfig,
    state: SafetyState,
    last: Diagnostics,
    ticks: u64,
}

impl ControlCycle {
    pub fn new(cfg: ControllerConfig) -> Result<Self, CycleError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: SafetyState::default(),
            last: Diagnostics::default(),
            ticks: 0,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub fn system_state(&self) -> SystemState {
        self.state.system_state()
    }

    pub fn safety_state(&self) -> &SafetyState {
        &self.state
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.last
    }

    /// Number of ticks evaluated so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Evaluate one pair of raw samples.
    pub fn tick(&mut self, samples: [u16; 2]) -> Tick {
        self.ticks += 1;
        let tick = self.ticks;

        let mut reading = ThrottleReading::from_samples(samples, &self.cfg.safety.ranges);
        let evaluation = safety::evaluate(&self.cfg.safety, &mut self.state, samples, &reading);

        let output = match evaluation {
            Evaluation::Latched => Output::Failure {
                newly_tripped: false,
            },
            Evaluation::Tripped(kind) => {
                tracing::error!(
                    tick,
                    reason = %kind,
                    raw1 = samples[0],
                    raw2 = samples[1],
                    "pedal sensor fault confirmed, throttle output disabled"
                );
                Output::Failure {
                    newly_tripped: true,
                }
            }
            Evaluation::Passed {
                range,
                plausibility,
            } => {
                if range == Verdict::Warning {
                    tracing::warn!(
                        tick,
                        raw1 = samples[0],
                        raw2 = samples[1],
                        "pedal sample out of range"
                    );
                }
                if plausibility == Verdict::Warning {
                    tracing::warn!(
                        tick,
                        p1 = reading.channel_one_pct,
                        p2 = reading.channel_two_pct,
                        "pedal channels disagree"
                    );
                }
                Output::Throttle(encode(reading.average_pct, self.cfg.payload_layout))
            }
        };

        if output.is_failure() {
            reading.average_pct = 0.0;
        }

        self.last = Diagnostics {
            state: self.state.system_state(),
            reason: self.state.latch.reason(),
            range_fault: self.state.range_fault.is_set(),
            disagreement_fault: self.state.disagreement_fault.is_set(),
            raw: samples,
            channel_one_pct: reading.channel_one_pct,
            channel_two_pct: reading.channel_two_pct,
            average_pct: reading.average_pct,
        };

        tracing::debug!(
            tick,
            avg = self.last.average_pct,
            failed = output.is_failure(),
            "tick evaluated"
        );

        Tick {
            output,
            frame: output.frame(),
            diagnostics: self.last,
        }
    }

    /// Run [`tick`](Self::tick) and hand the frame to `sink`.
    ///
    /// The tick's state changes are kept even when the send fails.
    pub fn tick_and_send<S: FrameSink>(
        &mut self,
        samples: [u16; 2],
        sink: &mut S,
    ) -> Result<Tick, CycleError> {
        let tick = self.tick(samples);
        sink.send(&tick.frame).map_err(|e| CycleError::Transmit {
            id: tick.frame.id,
            tick: Box::new(tick),
            source: Box::new(e),
        })?;
        Ok(tick)
    }
}
