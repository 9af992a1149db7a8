//! Serde data file structs for plant descriptions.
//!
//! These structs define the on-disk format for a plating line: its baths and
//! routes, carriers, the order backlog, and any constants that differ from
//! the built-in defaults. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into core types by the loader.
//!
//! Masses and currents are plain decimals on disk and become fixed-point
//! only during resolution.

use platesim_core::bath::{BathType, Priority};
use platesim_core::order::ProcessType;
use platesim_core::scheduler::SchedulerKind;
use serde::Deserialize;

// ===========================================================================
// Top level
// ===========================================================================

/// A complete plant description.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantData {
    pub name: String,
    /// Position the crane starts at.
    pub transport_start: u32,
    #[serde(default)]
    pub scheduler: SchedulerKind,
    /// Baths by position. Unlisted positions become disabled slots.
    pub baths: Vec<BathData>,
    /// Carrier numbers, placed in this order.
    pub carriers: Vec<u32>,
    #[serde(default)]
    pub orders: Vec<OrderData>,
    #[serde(default)]
    pub timing: TimingData,
    #[serde(default)]
    pub dwell: DwellData,
    #[serde(default)]
    pub grace: GraceData,
    #[serde(default)]
    pub plating: PlatingData,
    /// Bath types tried, in order, when placing carriers at start-up.
    #[serde(default)]
    pub placement: Option<Vec<BathType>>,
    #[serde(default)]
    pub event_capacity: Option<usize>,
    #[serde(default)]
    pub simulation: SimulationData,
}

// ===========================================================================
// Baths
// ===========================================================================

/// One bath at a physical position.
#[derive(Debug, Clone, Deserialize)]
pub struct BathData {
    pub position: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub kind: Option<BathType>,
    #[serde(default)]
    pub priority: Priority,
    /// Drain time above this bath, replacing the crane default.
    #[serde(default)]
    pub drain: Option<u64>,
    #[serde(default)]
    pub routes: Vec<RouteData>,
}

/// Candidate next baths for a set of process types, most preferred first.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteData {
    pub processes: Vec<ProcessType>,
    pub to: Vec<u32>,
}

fn default_true() -> bool {
    true
}

// ===========================================================================
// Orders
// ===========================================================================

/// A work order in the initial backlog.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderData {
    pub number: String,
    #[serde(default)]
    pub material: String,
    pub process: ProcessType,
    /// Grams of silver per 1000 parts.
    pub silver_mass: f64,
    /// Grams of copper per 1000 parts.
    #[serde(default)]
    pub copper_mass: Option<f64>,
    pub quantity: u32,
    #[serde(default)]
    pub overrides: Vec<OverrideData>,
}

/// Fixed dwell for one bath type, replacing the computed or standard value.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideData {
    pub kind: BathType,
    pub seconds: u64,
}

// ===========================================================================
// Constants
// ===========================================================================

/// Crane timing. Absent fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingData {
    pub drain: Option<u64>,
    pub pick: Option<u64>,
    pub drop: Option<u64>,
    pub accelerate: Option<u64>,
    pub middle: Option<u64>,
    pub decelerate: Option<u64>,
    pub contiguous: Option<u64>,
}

/// Entries added to or replacing the standard dwell table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DwellData {
    #[serde(default)]
    pub standard: Vec<DwellEntry>,
    #[serde(default)]
    pub unlisted: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DwellEntry {
    pub kind: BathType,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraceData {
    pub transport: Option<u64>,
    pub empty_carrier: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatingData {
    /// Amperes.
    pub silver_current: Option<f64>,
    /// Amperes.
    pub copper_current: Option<f64>,
    pub silver_deposition: Option<f64>,
}

/// Run settings stored alongside the plant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationData {
    pub speed: Option<u32>,
    pub max_time: Option<u64>,
    pub step: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}
