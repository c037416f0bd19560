use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use controller::{CanFrame, ControlCycle, ControllerConfig, Diagnostics, FrameSink, PayloadLayout};
use sim::PedalRig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    Normal,
    Glitch,
    OpenCircuit,
    SensorDisagree,
    IdleDisagree,
}

impl From<Scenario> for sim::Scenario {
    fn from(s: Scenario) -> Self {
        match s {
            Scenario::Normal => sim::Scenario::Normal,
            Scenario::Glitch => sim::Scenario::Glitch,
            Scenario::OpenCircuit => sim::Scenario::OpenCircuit,
            Scenario::SensorDisagree => sim::Scenario::SensorDisagree,
            Scenario::IdleDisagree => sim::Scenario::IdleDisagree,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    Compact,
    Positional,
}

#[derive(Parser, Debug)]
#[command(
    name = "apps-failsafe",
    version,
    about = "Dual-channel pedal sensor fail-safe simulation"
)]
struct Args {
    #[arg(value_enum, long, default_value = "normal")]
    scenario: Scenario,

    /// Total simulation time in seconds
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// JSON controller configuration; reference defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick period in milliseconds (overrides the config file)
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Maximum channel disagreement in percentage points
    #[arg(long)]
    diff_threshold: Option<f64>,

    /// Average throttle below which disagreement is ignored
    #[arg(long)]
    min_activation: Option<f64>,

    /// Payload digit layout
    #[arg(value_enum, long)]
    layout: Option<Layout>,

    /// Sleep one tick period between ticks
    #[arg(long)]
    realtime: bool,

    /// Stop after the tick that sets the fail-safe latch
    #[arg(long)]
    stop_on_trip: bool,

    /// Write every transmitted frame to this file as JSON lines
    #[arg(long)]
    bus_log: Option<PathBuf>,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(serde::Serialize)]
struct TraceRow<'a> {
    t_s: f64,
    pedal_pct: f64,
    #[serde(flatten)]
    diagnostics: &'a Diagnostics,
    frame: &'a CanFrame,
}

/// Stand-in for the bus driver: one JSON line per transmitted frame.
struct BusLog {
    out: Box<dyn Write>,
    sent: u64,
}

impl BusLog {
    fn open(path: Option<&Path>) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(p) => Box::new(io::BufWriter::new(
                File::create(p).with_context(|| format!("failed to create {}", p.display()))?,
            )),
            None => Box::new(io::sink()),
        };
        Ok(Self { out, sent: 0 })
    }
}

impl FrameSink for BusLog {
    type Error = io::Error;

    fn send(&mut self, frame: &CanFrame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        writeln!(self.out)?;
        self.sent += 1;
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.as_str().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(ms) = args.tick_ms {
        cfg.tick_period_ms = ms;
    }
    if let Some(d) = args.diff_threshold {
        cfg.safety.diff_threshold_pct = d;
    }
    if let Some(m) = args.min_activation {
        cfg.safety.min_activation_pct = m;
    }
    if let Some(layout) = args.layout {
        cfg.payload_layout = match layout {
            Layout::Compact => PayloadLayout::Compact,
            Layout::Positional => PayloadLayout::Positional,
        };
    }

    let mut cycle = ControlCycle::new(cfg).context("invalid controller configuration")?;
    let mut rig = PedalRig::new(args.scenario.into(), &cfg.safety, args.seconds, args.seed);

    // Simulated time advances by the configured period even when not sleeping.
    let dt_s = if cfg.tick_period_ms > 0 {
        cfg.tick_period_ms as f64 / 1000.0
    } else {
        0.1
    };
    let steps = (args.seconds / dt_s).ceil() as u64;

    tracing::info!(
        scenario = ?args.scenario,
        steps,
        tick_ms = cfg.tick_period_ms,
        "starting pedal simulation"
    );

    let mut bus = BusLog::open(args.bus_log.as_deref())?;
    let mut stdout = io::stdout().lock();

    // Output JSONL trace to stdout (one object per tick)
    for _ in 0..steps {
        let t_s = rig.time_s();
        let samples = rig.sample(dt_s);

        let result = cycle.tick_and_send(samples, &mut bus);

        // A tick whose frame was never sent still goes into the trace.
        let evaluated = match &result {
            Ok(tick) => Some(tick),
            Err(e) => e.tick(),
        };
        if let Some(tick) = evaluated {
            let row = TraceRow {
                t_s,
                pedal_pct: rig.pedal.position_pct,
                diagnostics: &tick.diagnostics,
                frame: &tick.frame,
            };
            serde_json::to_writer(&mut stdout, &row)?;
            writeln!(stdout)?;
        }

        let tick = result.with_context(|| format!("halting at t={t_s:.2}s"))?;

        if args.stop_on_trip && tick.output.is_failure() {
            break;
        }
        if args.realtime {
            std::thread::sleep(cfg.tick_period());
        }
    }
    bus.out.flush().context("failed to flush bus log")?;

    tracing::info!(
        state = ?cycle.system_state(),
        reason = ?cycle.diagnostics().reason,
        ticks = cycle.ticks(),
        frames = bus.sent,
        "simulation finished"
    );

    Ok(())
}
