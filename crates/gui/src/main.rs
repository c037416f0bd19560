use controller::{ControlCycle, ControllerConfig, Diagnostics};
use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};
use safety::SystemState;
use serde::Deserialize;
use sim::{PedalRig, Scenario};
use std::fs;

#[derive(Clone, Debug)]
struct Sample {
    t: f64,
    pedal: f64,
    raw1: f64,
    raw2: f64,
    p1: f64,
    p2: f64,
    avg: f64,
    failed: bool,
}

impl Sample {
    fn new(t: f64, pedal: f64, d: &Diagnostics) -> Self {
        Self {
            t,
            pedal,
            raw1: f64::from(d.raw[0]),
            raw2: f64::from(d.raw[1]),
            p1: d.channel_one_pct,
            p2: d.channel_two_pct,
            avg: d.average_pct,
            failed: d.state == SystemState::Failed,
        }
    }
}

/// One line of the CLI's JSONL trace.
#[derive(Debug, Deserialize)]
struct CliLine {
    t_s: f64,
    pedal_pct: f64,
    #[serde(flatten)]
    diagnostics: Diagnostics,
}

struct App {
    // Settings
    scenario: Scenario,
    seconds: f64,
    tick_ms: u64,
    diff_threshold: f64,
    min_activation: f64,
    seed: u64,

    // Live simulation state
    running: bool,
    t: f64,
    dt_s: f64,
    max_steps: u64,
    step_count: u64,

    cycle: Option<ControlCycle>,
    rig: PedalRig,

    // Data shown in plots
    samples: Vec<Sample>,

    // Replay
    replay_loaded: bool,
    replay_path: String,
    replay_all: Vec<Sample>,
    replay_pos: usize,
    replay_playing: bool,
    replay_speed: usize, // samples per frame
    replay_reason: Option<String>,
    last_error: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        let cfg = ControllerConfig::default();
        let scenario = Scenario::Normal;
        let seconds = 30.0;
        let seed = 12345;

        let mut app = Self {
            scenario,
            seconds,
            tick_ms: cfg.tick_period_ms,
            diff_threshold: cfg.safety.diff_threshold_pct,
            min_activation: cfg.safety.min_activation_pct,
            seed,

            running: false,
            t: 0.0,
            dt_s: 0.1,
            max_steps: 0,
            step_count: 0,

            cycle: None,
            rig: PedalRig::new(scenario, &cfg.safety, seconds, seed),

            samples: Vec::new(),

            replay_loaded: false,
            replay_path: "out/open_circuit.jsonl".to_string(),
            replay_all: Vec::new(),
            replay_pos: 0,
            replay_playing: false,
            replay_speed: 10,
            replay_reason: None,
            last_error: None,
        };

        app.reset_live();
        app
    }
}

impl App {
    fn config(&self) -> ControllerConfig {
        let mut cfg = ControllerConfig {
            tick_period_ms: self.tick_ms,
            ..Default::default()
        };
        cfg.safety.diff_threshold_pct = self.diff_threshold;
        cfg.safety.min_activation_pct = self.min_activation;
        cfg
    }

    fn clear_replay(&mut self) {
        self.replay_loaded = false;
        self.replay_all.clear();
        self.replay_pos = 0;
        self.replay_playing = false;
        self.replay_reason = None;
        self.last_error = None;
    }

    /// Fresh controller and rig: the simulated power cycle.
    fn reset_live(&mut self) {
        let cfg = self.config();

        self.running = false;
        self.t = 0.0;
        self.dt_s = self.tick_ms.max(1) as f64 / 1000.0;
        self.max_steps = (self.seconds / self.dt_s).ceil() as u64;
        self.step_count = 0;

        self.cycle = match ControlCycle::new(cfg) {
            Ok(c) => Some(c),
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        };
        self.rig = PedalRig::new(self.scenario, &cfg.safety, self.seconds, self.seed);

        self.samples.clear();
    }

    fn reset(&mut self) {
        self.clear_replay();
        self.reset_live();
    }

    fn load_jsonl(&mut self, path: &str) {
        self.last_error = None;

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                self.last_error = Some(format!("Failed to read {path}: {e}"));
                return;
            }
        };

        let mut loaded: Vec<Sample> = Vec::new();
        let mut first_reason: Option<String> = None;

        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let row: CliLine = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(e) => {
                    self.last_error = Some(format!("JSON parse error at line {}: {}", i + 1, e));
                    return;
                }
            };

            if first_reason.is_none() {
                if let Some(r) = row.diagnostics.reason {
                    first_reason = Some(r.to_string());
                }
            }

            loaded.push(Sample::new(row.t_s, row.pedal_pct, &row.diagnostics));
        }

        if loaded.is_empty() {
            self.last_error = Some(format!("No samples found in {path}"));
            return;
        }

        // Enter replay mode
        self.running = false;
        self.clear_replay();
        self.replay_loaded = true;
        self.replay_reason = first_reason;

        self.replay_all = loaded;
        self.replay_pos = 0;
        self.replay_playing = false;

        // Start with an initial chunk so the plot isn't empty
        self.samples.clear();
        let initial = self.replay_speed.min(self.replay_all.len()).max(1);
        self.samples.extend_from_slice(&self.replay_all[..initial]);
        self.replay_pos = initial;

        self.t = self.samples.last().map(|s| s.t).unwrap_or(0.0);
    }

    fn replay_advance(&mut self, n: usize) {
        if self.replay_pos >= self.replay_all.len() {
            self.replay_playing = false;
            return;
        }

        let end = (self.replay_pos + n.max(1)).min(self.replay_all.len());
        self.samples
            .extend_from_slice(&self.replay_all[self.replay_pos..end]);
        self.replay_pos = end;

        self.t = self.samples.last().map(|s| s.t).unwrap_or(self.t);

        if self.replay_pos >= self.replay_all.len() {
            self.replay_playing = false;
        }
    }

    fn replay_tick(&mut self) {
        if self.replay_loaded && self.replay_playing {
            self.replay_advance(self.replay_speed);
        }
    }

    fn trip_time_for_plot(&self) -> Option<f64> {
        let all = if self.replay_loaded {
            &self.replay_all
        } else {
            &self.samples
        };
        all.iter().find(|s| s.failed).map(|s| s.t)
    }

    fn failed_now(&self) -> bool {
        if self.replay_loaded {
            self.samples.last().map(|s| s.failed).unwrap_or(false)
        } else {
            self.cycle
                .as_ref()
                .map(|c| c.system_state() == SystemState::Failed)
                .unwrap_or(false)
        }
    }

    fn reason_text(&self) -> String {
        if let Some(r) = self.replay_reason.as_ref() {
            return r.clone();
        }
        self.cycle
            .as_ref()
            .and_then(|c| c.diagnostics().reason)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "—".to_string())
    }

    fn step_once_live(&mut self) {
        if self.step_count >= self.max_steps {
            self.running = false;
            return;
        }
        let Some(cycle) = self.cycle.as_mut() else {
            self.running = false;
            return;
        };

        let samples = self.rig.sample(self.dt_s);
        let tick = cycle.tick(samples);

        self.samples.push(Sample::new(
            self.t,
            self.rig.pedal.position_pct,
            &tick.diagnostics,
        ));

        self.t += self.dt_s;
        self.step_count += 1;
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.replay_tick();
        if self.replay_playing {
            ctx.request_repaint();
        }

        let mode_txt = if self.replay_loaded { "REPLAY" } else { "LIVE" };
        let failed_now = self.failed_now();
        let trip_time = self.trip_time_for_plot();
        let reason_txt = self.reason_text();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("APPS Fail-Safe Monitor");
                ui.separator();
                ui.label(format!("MODE: {mode_txt}"));
                ui.separator();

                let label = if failed_now { "STATE: FAILED" } else { "STATE: NORMAL" };
                let color = if failed_now {
                    egui::Color32::RED
                } else {
                    egui::Color32::GREEN
                };
                ui.colored_label(color, label);

                if let Some(t) = trip_time {
                    ui.separator();
                    ui.label(format!("t_trip = {:.2}s", t));
                    ui.separator();
                    ui.label(format!("reason = {reason_txt}"));
                }
            });
        });

        egui::SidePanel::left("left")
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Scenario");

                if self.replay_loaded {
                    ui.add_enabled(false, egui::Label::new(self.scenario.label()));
                } else {
                    let mut scenario_new = self.scenario;
                    egui::ComboBox::from_id_salt("scenario")
                        .selected_text(self.scenario.label())
                        .show_ui(ui, |ui| {
                            for s in Scenario::ALL {
                                ui.selectable_value(&mut scenario_new, s, s.label());
                            }
                        });

                    if scenario_new != self.scenario {
                        self.scenario = scenario_new;
                        self.reset_live();
                    }
                }

                ui.separator();
                ui.label("Simulation settings");

                let live_enabled = !self.replay_loaded;
                ui.add_enabled(
                    live_enabled,
                    egui::Slider::new(&mut self.seconds, 5.0..=120.0).text("seconds"),
                );
                ui.add_enabled(
                    live_enabled,
                    egui::Slider::new(&mut self.tick_ms, 10..=200).text("tick (ms)"),
                );
                ui.add_enabled(
                    live_enabled,
                    egui::Slider::new(&mut self.diff_threshold, 1.0..=50.0)
                        .text("diff threshold (%)"),
                );
                ui.add_enabled(
                    live_enabled,
                    egui::Slider::new(&mut self.min_activation, 0.0..=50.0)
                        .text("min activation (%)"),
                );
                ui.add_enabled(
                    live_enabled,
                    egui::DragValue::new(&mut self.seed).prefix("seed: "),
                );

                ui.separator();
                ui.horizontal(|ui| {
                    // Settings only take effect on a power cycle.
                    if ui.button("Power cycle").clicked() {
                        self.reset();
                    }

                    let run_label = if self.running { "Pause" } else { "Run" };
                    if ui
                        .add_enabled(live_enabled, egui::Button::new(run_label))
                        .clicked()
                    {
                        if !self.running {
                            self.clear_replay();
                            self.reset_live();
                            self.running = true;
                        } else {
                            self.running = false;
                        }
                    }

                    if ui
                        .add_enabled(live_enabled, egui::Button::new("Step"))
                        .clicked()
                    {
                        self.step_once_live();
                    }
                });

                ui.separator();
                ui.label("Replay (JSONL)");
                ui.horizontal(|ui| {
                    ui.label("path:");
                    ui.text_edit_singleline(&mut self.replay_path);
                });

                ui.horizontal(|ui| {
                    if ui.button("Load").clicked() {
                        let p = self.replay_path.clone();
                        self.load_jsonl(&p);
                    }

                    if ui
                        .button(if self.replay_playing {
                            "Pause replay"
                        } else {
                            "Play replay"
                        })
                        .clicked()
                        && self.replay_loaded
                    {
                        self.replay_playing = !self.replay_playing;
                        ctx.request_repaint();
                    }

                    if ui.button("Step replay").clicked() && self.replay_loaded {
                        self.replay_advance(1);
                    }
                });

                ui.add(
                    egui::Slider::new(&mut self.replay_speed, 1..=100)
                        .text("replay speed (samples/frame)"),
                );

                if self.replay_loaded {
                    ui.small(format!(
                        "Loaded: {}/{} samples",
                        self.samples.len(),
                        self.replay_all.len()
                    ));
                } else {
                    ui.small("No replay loaded.");
                }

                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }

                ui.separator();
                ui.small("Tip: cli --scenario open-circuit > out/open_circuit.jsonl, then Load.");
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.running && !self.replay_loaded {
                for _ in 0..2 {
                    if !self.running {
                        break;
                    }
                    self.step_once_live();
                }
                ctx.request_repaint();
            }

            let Some(last) = self.samples.last().cloned() else {
                ui.label("No data yet. Run LIVE or Load a REPLAY file.");
                return;
            };

            let pct_points = |f: fn(&Sample) -> f64| -> PlotPoints {
                self.samples.iter().map(|s| [s.t, f(s)]).collect()
            };

            ui.heading("Throttle (%)");
            Plot::new("pct_plot").height(240.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(pct_points(|s| s.pedal)).name("Pedal travel"));
                plot_ui.line(Line::new(pct_points(|s| s.p1)).name("Channel 1"));
                plot_ui.line(Line::new(pct_points(|s| s.p2)).name("Channel 2"));
                plot_ui.line(Line::new(pct_points(|s| s.avg)).name("Output average"));

                if let Some(t) = trip_time {
                    let vline: PlotPoints = vec![[t, 0.0], [t, 100.0]].into();
                    plot_ui.line(Line::new(vline).name("Trip"));
                }
            });

            ui.heading("Raw ADC");
            Plot::new("raw_plot").height(180.0).show(ui, |plot_ui| {
                plot_ui.line(Line::new(pct_points(|s| s.raw1)).name("Raw 1"));
                plot_ui.line(Line::new(pct_points(|s| s.raw2)).name("Raw 2"));
            });

            ui.separator();
            ui.label(format!(
                "t={:.2}s  pedal={:.1}%  ch1={:.1}%  ch2={:.1}%  out={:.2}%",
                last.t, last.pedal, last.p1, last.p2, last.avg
            ));
        });
    }
}

fn main() -> eframe::Result<()> {
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "APPS Fail-Safe Monitor",
        native_options,
        Box::new(|_cc| Ok(Box::new(App::default()))),
    )
}
