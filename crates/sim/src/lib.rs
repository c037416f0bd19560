use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use safety::{OperatingRange, SafetyConfig, ADC_MAX};

#[derive(Clone, Copy, Debug)]
pub struct PedalParams {
    /// Maximum travel speed in percent per second.
    pub slew_pct_per_s: f64,
}

impl Default for PedalParams {
    fn default() -> Self {
        Self {
            slew_pct_per_s: 120.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Pedal {
    /// Actual pedal travel, 0..=100 %.
    pub position_pct: f64,
    /// Where the driver's foot is heading.
    pub target_pct: f64,
}

impl Pedal {
    /// Move toward the target at most `slew * dt` percent.
    pub fn step(&mut self, p: &PedalParams, dt_s: f64) {
        let max_move = p.slew_pct_per_s * dt_s;
        let delta = (self.target_pct - self.position_pct).clamp(-max_move, max_move);
        self.position_pct = (self.position_pct + delta).clamp(0.0, 100.0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorFault {
    None,
    /// Output frozen at a raw value.
    Stuck { raw: u16 },
    /// Constant offset in ADC counts.
    Bias { counts: f64 },
    /// Offset growing with time.
    Drift { counts_per_s: f64 },
    /// Every n-th sample reads 0 (intermittent connector).
    DropoutEvery { n: u64 },
    /// Broken wire, reads 0.
    Open,
}

/// One potentiometer channel feeding a 10-bit ADC.
#[derive(Clone, Debug)]
pub struct Sensor {
    /// Gaussian noise in ADC counts.
    pub noise_std: f64,
    pub fault: SensorFault,
    /// Raw value at 0 % and at 100 % pedal travel.
    pub travel: (f64, f64),
    rng: StdRng,
    step_count: u64,
}

impl Sensor {
    pub fn new(seed: u64, range: OperatingRange) -> Self {
        Self {
            noise_std: 1.0,
            fault: SensorFault::None,
            travel: (f64::from(range.low), f64::from(range.high)),
            rng: StdRng::seed_from_u64(seed),
            step_count: 0,
        }
    }

    /// Keep pedal travel `margin_pct` of the span inside each end of the range,
    /// the way a real pedal never quite reaches its electrical stops.
    pub fn with_margin(mut self, margin_pct: f64) -> Self {
        let (low, high) = self.travel;
        let inset = (high - low) * margin_pct / 100.0;
        self.travel = (low + inset, high - inset);
        self
    }

    /// Sample the channel for a given pedal position.
    pub fn read_raw(&mut self, position_pct: f64, dt_s: f64) -> u16 {
        self.step_count += 1;

        let (low, high) = self.travel;
        let ideal = low + position_pct / 100.0 * (high - low);

        let mut v = match self.fault {
            SensorFault::None => ideal,
            SensorFault::Stuck { raw } => return raw.min(ADC_MAX),
            SensorFault::Bias { counts } => ideal + counts,
            SensorFault::Drift { counts_per_s } => {
                ideal + counts_per_s * (self.step_count as f64) * dt_s
            }
            SensorFault::DropoutEvery { n } => {
                if n > 0 && (self.step_count % n) == 0 {
                    return 0;
                }
                ideal
            }
            SensorFault::Open => return 0,
        };

        if self.noise_std > 0.0 {
            if let Ok(normal) = Normal::new(0.0, self.noise_std) {
                v += normal.sample(&mut self.rng);
            }
        }

        v.round().clamp(0.0, f64::from(ADC_MAX)) as u16
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Clean sensors, press and release.
    Normal,
    /// Isolated single-sample dropouts on channel one.
    Glitch,
    /// Channel one wire breaks part way through.
    OpenCircuit,
    /// Channel two reads high while the pedal is pressed.
    SensorDisagree,
    /// Channel two reads high but the pedal stays near idle.
    IdleDisagree,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Normal,
        Scenario::Glitch,
        Scenario::OpenCircuit,
        Scenario::SensorDisagree,
        Scenario::IdleDisagree,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Normal => "Normal",
            Scenario::Glitch => "Glitch (single dropouts on ch1)",
            Scenario::OpenCircuit => "Open circuit (ch1 after 30%)",
            Scenario::SensorDisagree => "Sensor disagree (bias on ch2)",
            Scenario::IdleDisagree => "Idle disagree (bias on ch2, pedal at idle)",
        }
    }

    /// Pedal target at `t_s` into a run of `total_s`.
    pub fn pedal_target(self, t_s: f64, total_s: f64) -> f64 {
        if self == Scenario::IdleDisagree {
            return 1.0;
        }
        let frac = if total_s > 0.0 { t_s / total_s } else { 0.0 };
        match frac {
            f if f < 0.1 => 0.0,
            f if f < 0.5 => 80.0,
            f if f < 0.7 => 35.0,
            _ => 0.0,
        }
    }
}

const TRAVEL_MARGIN_PCT: f64 = 2.0;

/// Simulated pedal assembly: the pedal and its two sensor channels.
#[derive(Clone, Debug)]
pub struct PedalRig {
    pub params: PedalParams,
    pub pedal: Pedal,
    pub sensors: [Sensor; 2],
    pub scenario: Scenario,
    total_s: f64,
    t_s: f64,
}

impl PedalRig {
    /// Build a rig whose sensors span the configured operating ranges.
    pub fn new(scenario: Scenario, cfg: &SafetyConfig, total_s: f64, seed: u64) -> Self {
        let mut rig = Self {
            params: PedalParams::default(),
            pedal: Pedal::default(),
            sensors: [
                Sensor::new(seed ^ 0xA1, cfg.ranges[0]).with_margin(TRAVEL_MARGIN_PCT),
                Sensor::new(seed ^ 0xB2, cfg.ranges[1]).with_margin(TRAVEL_MARGIN_PCT),
            ],
            scenario,
            total_s,
            t_s: 0.0,
        };

        match scenario {
            Scenario::Normal | Scenario::OpenCircuit => {}
            Scenario::Glitch => rig.sensors[0].fault = SensorFault::DropoutEvery { n: 25 },
            Scenario::SensorDisagree => {
                // About 12 points apart, but the idle average stays under the floor.
                rig.sensors[1].fault = SensorFault::Bias { counts: 75.0 };
            }
            Scenario::IdleDisagree => {
                rig.sensors[1].fault = SensorFault::Bias { counts: 65.0 };
                rig.pedal.position_pct = 1.0;
            }
        }
        rig
    }

    pub fn time_s(&self) -> f64 {
        self.t_s
    }

    /// Advance the pedal by `dt_s` and sample both channels.
    pub fn sample(&mut self, dt_s: f64) -> [u16; 2] {
        if self.scenario == Scenario::OpenCircuit && self.t_s > self.total_s * 0.3 {
            self.sensors[0].fault = SensorFault::Open;
        }

        self.pedal.target_pct = self.scenario.pedal_target(self.t_s, self.total_s);
        self.pedal.step(&self.params, dt_s);

        let pos = self.pedal.position_pct;
        let [s1, s2] = &mut self.sensors;
        let samples = [s1.read_raw(pos, dt_s), s2.read_raw(pos, dt_s)];

        self.t_s += dt_s;
        samples
    }
}
