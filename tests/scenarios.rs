use apps_failsafe as apps;

const DT_S: f64 = 0.1;

/// Where and why a simulated run latched.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Trip {
    tick: u64,
    reason: apps::FaultKind,
    pedal_pct: f64,
}

/// Run a simulated scenario through a fresh controller and report the tick at
/// which the latch was set.
fn run(
    scenario: apps::Scenario,
    seconds: f64,
    seed: u64,
) -> Result<Option<Trip>, apps::CycleError> {
    let cfg = apps::ControllerConfig::default();
    let mut cycle = apps::ControlCycle::new(cfg)?;
    let mut rig = apps::PedalRig::new(scenario, &cfg.safety, seconds, seed);

    let steps = (seconds / DT_S).ceil() as u64;
    let mut tripped = None;
    for _ in 0..steps {
        let tick = cycle.tick(rig.sample(DT_S));
        if let apps::Output::Failure { newly_tripped: true } = tick.output {
            tripped = tick.diagnostics.reason.map(|reason| Trip {
                tick: cycle.ticks(),
                reason,
                pedal_pct: rig.pedal.position_pct,
            });
        }
        if tripped.is_some() {
            assert!(tick.frame.is_failure());
        }
    }
    Ok(tripped)
}

#[test]
fn reference_range_fault_scenario() -> Result<(), apps::CycleError> {
    let mut cycle = apps::ControlCycle::new(apps::ControllerConfig::default())?;

    let first = cycle.tick([50, 500]);
    assert_eq!(first.frame.id, apps::THROTTLE_FRAME_ID);
    assert_eq!(cycle.system_state(), apps::SystemState::Normal);

    let second = cycle.tick([50, 500]);
    assert_eq!(
        second.output,
        apps::Output::Failure {
            newly_tripped: true
        }
    );
    assert_eq!(cycle.system_state(), apps::SystemState::Failed);
    assert_eq!(second.diagnostics.reason, Some(apps::FaultKind::Range));

    for _ in 0..20 {
        let tick = cycle.tick([400, 500]);
        assert_eq!(tick.frame.id, apps::FAILURE_FRAME_ID);
        assert_eq!(cycle.system_state(), apps::SystemState::Failed);
    }
    Ok(())
}

#[test]
fn reference_plausibility_scenario() -> Result<(), apps::CycleError> {
    let cfg = apps::ControllerConfig::default();
    let mut cycle = apps::ControlCycle::new(cfg)?;
    let [r1, r2] = cfg.safety.ranges;

    // Ranges where 60 % and 40 % land on whole ADC counts.
    let mut exact = cfg;
    exact.safety.ranges = [
        apps::OperatingRange::new(100, 600),
        apps::OperatingRange::new(200, 700),
    ];
    let mut exact_cycle = apps::ControlCycle::new(exact)?;
    let samples = [400, 400];

    let t1 = exact_cycle.tick(samples);
    assert!((t1.diagnostics.channel_one_pct - 60.0).abs() < 1e-9);
    assert!((t1.diagnostics.channel_two_pct - 40.0).abs() < 1e-9);
    assert!((t1.diagnostics.average_pct - 50.0).abs() < 1e-9);
    assert!(!t1.output.is_failure());

    let t2 = exact_cycle.tick(samples);
    assert_eq!(t2.diagnostics.reason, Some(apps::FaultKind::Plausibility));

    // Same shape on the reference ranges, within a count.
    let near = [
        r1.low + (f64::from(r1.span()) * 0.6).round() as u16,
        r2.low + (f64::from(r2.span()) * 0.4).round() as u16,
    ];
    cycle.tick(near);
    assert_eq!(
        cycle.tick(near).output,
        apps::Output::Failure {
            newly_tripped: true
        }
    );
    Ok(())
}

#[test]
fn failed_controller_never_encodes_again() -> Result<(), apps::CycleError> {
    let mut cycle = apps::ControlCycle::new(apps::ControllerConfig::default())?;
    cycle.tick([0, 0]);
    cycle.tick([0, 0]);

    for raw in (0..=1023u16).step_by(31) {
        let tick = cycle.tick([raw, raw]);
        assert!(tick.output.is_failure());
        assert!(tick.frame.payload().is_empty());
        assert!(tick.diagnostics.average_pct.abs() < f64::EPSILON);
    }
    Ok(())
}

#[test]
fn restart_is_the_only_recovery() -> Result<(), apps::CycleError> {
    let cfg = apps::ControllerConfig::default();
    let mut cycle = apps::ControlCycle::new(cfg)?;
    cycle.tick([2000, 500]);
    cycle.tick([2000, 500]);
    assert_eq!(cycle.system_state(), apps::SystemState::Failed);

    let mut restarted = apps::ControlCycle::new(cfg)?;
    assert_eq!(restarted.system_state(), apps::SystemState::Normal);
    assert_eq!(restarted.tick([410, 512]).frame.id, apps::THROTTLE_FRAME_ID);
    Ok(())
}

#[test]
fn clean_pedal_run_never_trips() -> Result<(), apps::CycleError> {
    for seed in [1, 12345, 0xDEAD] {
        assert_eq!(run(apps::Scenario::Normal, 60.0, seed)?, None);
    }
    Ok(())
}

#[test]
fn isolated_dropouts_never_trip() -> Result<(), apps::CycleError> {
    assert_eq!(run(apps::Scenario::Glitch, 60.0, 12345)?, None);
    Ok(())
}

#[test]
fn open_circuit_trips_range_after_two_ticks() -> Result<(), apps::CycleError> {
    let seconds = 20.0;
    let Some(Trip { tick, reason, .. }) = run(apps::Scenario::OpenCircuit, seconds, 7)? else {
        panic!("open circuit never tripped");
    };
    assert_eq!(reason, apps::FaultKind::Range);

    // The wire breaks once t passes 30 % of the run; the second bad sample trips.
    let first_open = (seconds * 0.3 / DT_S).round() as u64;
    assert!(
        (first_open + 1..=first_open + 3).contains(&tick),
        "tripped at tick {tick}"
    );
    Ok(())
}

#[test]
fn biased_channel_trips_plausibility() -> Result<(), apps::CycleError> {
    let seconds = 20.0;
    let Some(trip) = run(apps::Scenario::SensorDisagree, seconds, 99)? else {
        panic!("biased channel never tripped");
    };
    assert_eq!(trip.reason, apps::FaultKind::Plausibility);

    // Quiet at idle; the fault is only confirmed once the pedal is pressed.
    let press_starts = (seconds * 0.1 / DT_S).round() as u64;
    assert!(trip.tick > press_starts, "tripped at tick {}", trip.tick);
    let floor = apps::SafetyConfig::default().min_activation_pct;
    assert!(trip.pedal_pct > 2.0 * floor, "tripped at pedal {}", trip.pedal_pct);
    Ok(())
}

#[test]
fn biased_channel_at_idle_never_trips() -> Result<(), apps::CycleError> {
    assert_eq!(run(apps::Scenario::IdleDisagree, 60.0, 12345)?, None);
    Ok(())
}
