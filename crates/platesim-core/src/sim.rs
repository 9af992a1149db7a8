//! The driver: simulation settings, run controls and the wall-clock pump.
//!
//! Simulated time advances only in whole steps of
//! [`SimulationSettings::step`] seconds. In real-time mode wall-clock time is
//! accumulated and one step runs per `1s / speed` of accumulated time, with
//! the remainder carried forward. Reaching `max_time` pauses the run.

use std::hash::Hasher;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PlantConfig;
use crate::error::ConfigError;
use crate::fixed::Seconds;
use crate::log::{LogLevel, Logger, Severity};
use crate::plant::Plant;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimulationSettings {
    /// Steps per wall-clock second in real-time mode.
    pub speed: u32,
    /// The run pauses once simulated time reaches this.
    pub max_time: Seconds,
    /// Simulated seconds per step.
    pub step: Seconds,
    #[serde(default)]
    pub verbosity: LogLevel,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            speed: 1000,
            max_time: 57_600,
            step: 2,
            verbosity: LogLevel::Standard,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        Ok(())
    }

    /// Wall-clock time per step in real-time mode.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.speed.max(1)
    }
}

// ---------------------------------------------------------------------------
// Status and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimStatus {
    /// Fresh plant, not yet started.
    Ready,
    Running,
    /// Paused by the user or by reaching `max_time`.
    Paused,
}

/// Result of a pump or run call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    pub steps_run: u64,
    /// The call ended because simulated time reached `max_time`.
    pub reached_max: bool,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Simulation {
    config: PlantConfig,
    settings: SimulationSettings,
    logger: Arc<dyn Logger>,
    plant: Plant,
    status: SimStatus,
    /// Wall-clock time not yet converted into steps.
    accumulator: Duration,
}

impl Simulation {
    pub fn new(
        config: PlantConfig,
        settings: SimulationSettings,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let plant = Plant::new(&config, logger.clone())?;
        Ok(Self {
            config,
            settings,
            logger,
            plant,
            status: SimStatus::Ready,
            accumulator: Duration::ZERO,
        })
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn plant_mut(&mut self) -> &mut Plant {
        &mut self.plant
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    pub fn status(&self) -> SimStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SimStatus::Running
    }

    fn at_max(&self) -> bool {
        self.plant.time() >= self.settings.max_time
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    /// Start from time zero. A plant that already ran is rebuilt first.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if self.status != SimStatus::Ready {
            self.rebuild()?;
        }
        self.status = SimStatus::Running;
        self.logger.log("Simulation:start", "started", Severity::Info);
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.status == SimStatus::Running {
            self.status = SimStatus::Paused;
            self.logger.log("Simulation:pause", "paused", Severity::Info);
        }
    }

    /// Continue a paused run. Refused once `max_time` has been reached.
    pub fn resume(&mut self) -> bool {
        if self.status != SimStatus::Paused || self.at_max() {
            return false;
        }
        self.status = SimStatus::Running;
        self.logger.log("Simulation:resume", "resumed", Severity::Info);
        true
    }

    /// Drop pending wall-clock time and return to a fresh, unstarted plant.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.accumulator = Duration::ZERO;
        self.rebuild()?;
        self.status = SimStatus::Ready;
        self.logger.log("Simulation:reset", "reset", Severity::Info);
        Ok(())
    }

    fn rebuild(&mut self) -> Result<(), ConfigError> {
        self.accumulator = Duration::ZERO;
        self.plant = Plant::new(&self.config, self.logger.clone())?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Run one step if running. Returns whether a step ran.
    pub fn tick(&mut self) -> bool {
        if self.status != SimStatus::Running {
            return false;
        }
        if self.at_max() {
            self.stop_at_max();
            return false;
        }
        self.plant.tick(self.settings.step);
        if self.at_max() {
            self.stop_at_max();
        }
        true
    }

    fn stop_at_max(&mut self) {
        self.status = SimStatus::Paused;
        self.accumulator = Duration::ZERO;
        self.logger.log(
            "Simulation:stop",
            &format!("reached {}", format_hms(self.plant.time())),
            Severity::Info,
        );
    }

    /// Convert elapsed wall-clock time into steps. Nothing accumulates while
    /// not running.
    pub fn pump(&mut self, elapsed: Duration) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.status != SimStatus::Running {
            return result;
        }
        self.accumulator += elapsed;
        let period = self.settings.tick_period();
        while self.accumulator >= period && self.status == SimStatus::Running {
            self.accumulator -= period;
            if self.tick() {
                result.steps_run += 1;
            }
        }
        result.reached_max = self.at_max();
        result
    }

    /// Run as fast as possible until `max_time`. Starts the run if needed.
    pub fn run_to_completion(&mut self) -> Result<AdvanceResult, ConfigError> {
        if self.status == SimStatus::Ready {
            self.start()?;
        }
        let mut result = AdvanceResult::default();
        while self.tick() {
            result.steps_run += 1;
        }
        result.reached_max = self.at_max();
        Ok(result)
    }

    /// Run paced against the wall clock, calling `observer` after every
    /// batch of steps. Returns when the run stops being `Running`.
    pub fn run_realtime<F>(&mut self, mut observer: F) -> Result<AdvanceResult, ConfigError>
    where
        F: FnMut(&Plant),
    {
        if self.status == SimStatus::Ready {
            self.start()?;
        }
        let period = self.settings.tick_period();
        let mut total = AdvanceResult::default();
        let mut last = Instant::now();
        while self.is_running() {
            std::thread::sleep(period);
            let now = Instant::now();
            let batch = self.pump(now - last);
            last = now;
            if batch.steps_run > 0 {
                total.steps_run += batch.steps_run;
                observer(&self.plant);
            }
        }
        total.reached_max = self.at_max();
        Ok(total)
    }
}

// ---------------------------------------------------------------------------
// Time formatting
// ---------------------------------------------------------------------------

/// Simulated seconds as `HH:MM:SS`. Hours keep counting past 99.
pub fn format_hms(seconds: Seconds) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit). Unlike `DefaultHasher` the result is the same in every
/// process, so plant hashes can be compared across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHasher(u64);

impl StateHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
}

impl Default for StateHasher {
    fn default() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl Hasher for StateHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = (self.0 ^ u64::from(byte)).wrapping_mul(Self::PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NullLogger;
    use crate::test_utils::*;

    fn sim(max_time: Seconds) -> Simulation {
        let settings = SimulationSettings {
            max_time,
            ..SimulationSettings::default()
        };
        Simulation::new(three_bath_config(1), settings, Arc::new(NullLogger)).unwrap()
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_hms(57_600), "16:00:00");
        assert_eq!(format_hms(360_000), "100:00:00");
    }

    #[test]
    fn zero_step_or_speed_is_rejected() {
        let zero_step = SimulationSettings {
            step: 0,
            ..SimulationSettings::default()
        };
        assert_eq!(zero_step.validate(), Err(ConfigError::ZeroStep));
        let zero_speed = SimulationSettings {
            speed: 0,
            ..SimulationSettings::default()
        };
        assert_eq!(zero_speed.validate(), Err(ConfigError::ZeroSpeed));
    }

    #[test]
    fn ticks_only_while_running() {
        let mut s = sim(100);
        assert_eq!(s.status(), SimStatus::Ready);
        assert!(!s.tick());
        s.start().unwrap();
        assert!(s.tick());
        assert_eq!(s.plant().time(), 2);
        s.pause();
        assert!(!s.tick());
        assert!(s.resume());
        assert!(s.tick());
        assert_eq!(s.plant().time(), 4);
    }

    #[test]
    fn stops_at_max_time_and_refuses_resume() {
        let mut s = sim(10);
        let result = s.run_to_completion().unwrap();
        assert_eq!(result.steps_run, 5);
        assert!(result.reached_max);
        assert_eq!(s.status(), SimStatus::Paused);
        assert_eq!(s.plant().time(), 10);
        assert!(!s.resume());
        assert!(!s.tick());
    }

    #[test]
    fn pump_carries_remainder() {
        let mut s = sim(1_000);
        s.start().unwrap();
        // speed 1000: one step per millisecond.
        let r = s.pump(Duration::from_micros(3_500));
        assert_eq!(r.steps_run, 3);
        let r = s.pump(Duration::from_micros(500));
        assert_eq!(r.steps_run, 1);
        assert_eq!(s.plant().time(), 8);
    }

    #[test]
    fn pump_ignored_while_paused() {
        let mut s = sim(1_000);
        s.start().unwrap();
        s.pause();
        assert_eq!(s.pump(Duration::from_secs(1)).steps_run, 0);
        assert!(s.resume());
        assert_eq!(s.pump(Duration::from_micros(999)).steps_run, 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut s = sim(1_000);
        let initial = s.plant().state_hash();
        s.start().unwrap();
        for _ in 0..100 {
            s.tick();
        }
        assert_ne!(s.plant().state_hash(), initial);
        s.pump(Duration::from_micros(700));

        s.reset().unwrap();
        assert_eq!(s.status(), SimStatus::Ready);
        assert_eq!(s.plant().state_hash(), initial);
        s.reset().unwrap();
        assert_eq!(s.plant().state_hash(), initial);

        // No leftover wall-clock time after reset.
        s.start().unwrap();
        assert_eq!(s.pump(Duration::from_micros(300)).steps_run, 0);
    }

    #[test]
    fn restart_rebuilds_plant() {
        let mut s = sim(1_000);
        s.start().unwrap();
        s.tick();
        s.start().unwrap();
        assert_eq!(s.plant().time(), 0);
        assert!(s.is_running());
    }

    #[test]
    fn hasher_matches_fnv1a_vectors() {
        assert_eq!(StateHasher::default().finish(), 0xcbf2_9ce4_8422_2325);
        let mut h = StateHasher::default();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn hasher_is_order_sensitive() {
        let mut a = StateHasher::default();
        a.write_u32(1);
        a.write_u32(2);
        let mut b = StateHasher::default();
        b.write_u32(2);
        b.write_u32(1);
        assert_ne!(a.finish(), b.finish());
    }
}
