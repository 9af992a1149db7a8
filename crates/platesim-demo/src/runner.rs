//! Loading a plant, applying command-line overrides, and driving a run.

use std::io::Write;
use std::path::PathBuf;

use platesim_core::event::EventKind;
use platesim_core::fixed::Seconds;
use platesim_core::log::LogLevel;
use platesim_core::plant::Plant;
use platesim_core::query::Renderer;
use platesim_core::sim::{SimulationSettings, Simulation};
use platesim_data::LoadedPlant;
use platesim_data::presets;

use crate::error::DemoError;
use crate::render::TextRenderer;

/// Where the plant description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantSource {
    File(PathBuf),
    Preset(String),
}

impl PlantSource {
    pub fn load(&self) -> Result<LoadedPlant, DemoError> {
        match self {
            PlantSource::File(path) => Ok(platesim_data::load_plant_file(path)?),
            PlantSource::Preset(name) => match presets::by_name(name) {
                Some(loaded) => Ok(loaded?),
                None => Err(DemoError::UnknownPreset {
                    name: name.clone(),
                    known: presets::PRESETS,
                }),
            },
        }
    }
}

/// Overrides and output options for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub speed: Option<u32>,
    pub max_time: Option<Seconds>,
    pub step: Option<Seconds>,
    pub verbose: bool,
    /// Pace the run against the wall clock instead of running flat out.
    pub realtime: bool,
    /// Print a snapshot every this many steps; 0 prints only the final one.
    pub render_every: u64,
}

impl RunOptions {
    /// Settings from the plant file with these overrides applied.
    pub fn apply(&self, settings: SimulationSettings) -> SimulationSettings {
        SimulationSettings {
            speed: self.speed.unwrap_or(settings.speed),
            max_time: self.max_time.unwrap_or(settings.max_time),
            step: self.step.unwrap_or(settings.step),
            verbosity: if self.verbose {
                LogLevel::Verbose
            } else {
                settings.verbosity
            },
        }
    }
}

/// Totals at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps_run: u64,
    pub time: Seconds,
    pub completed: usize,
    pub backlog: usize,
    pub distance: u64,
    /// Invariant violations among the retained events.
    pub violations: usize,
    pub events_dropped: u64,
}

impl RunReport {
    fn from_plant(plant: &Plant, steps_run: u64) -> Self {
        let events = plant.events();
        Self {
            steps_run,
            time: plant.time(),
            completed: plant.completed().len(),
            backlog: plant.backlog().len(),
            distance: plant.transport().cumulative_distance(),
            violations: events
                .iter()
                .filter(|e| e.event.kind() == EventKind::InvariantViolated)
                .count(),
            events_dropped: events.dropped_count(),
        }
    }
}

fn render_to<W: Write>(out: &mut W, plant: &Plant) -> std::io::Result<()> {
    writeln!(out, "{}", TextRenderer.render(&plant.snapshot()))
}

/// Drive `sim` until it stops at its maximum time, printing snapshots to
/// `out` every `render_every` steps and once at the end.
pub fn run<W: Write>(
    sim: &mut Simulation,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunReport, DemoError> {
    let step = sim.settings().step;
    let steps_run = if options.realtime {
        let mut last_rendered = 0;
        let mut write_error = None;
        let result = sim.run_realtime(|plant| {
            let steps = plant.time() / step;
            if options.render_every > 0 && steps - last_rendered >= options.render_every {
                last_rendered = steps;
                if let Err(e) = render_to(&mut *out, plant) {
                    write_error.get_or_insert(e);
                }
            }
        })?;
        if let Some(e) = write_error {
            return Err(e.into());
        }
        result.steps_run
    } else {
        sim.start()?;
        let mut steps = 0;
        while sim.tick() {
            steps += 1;
            if options.render_every > 0 && steps % options.render_every == 0 {
                render_to(out, sim.plant())?;
            }
        }
        steps
    };

    render_to(out, sim.plant())?;
    Ok(RunReport::from_plant(sim.plant(), steps_run))
}
