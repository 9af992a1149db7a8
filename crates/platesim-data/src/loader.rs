//! Resolution pipeline: reads a plant file, resolves positions and decimals,
//! and builds a validated [`PlantConfig`] with its [`SimulationSettings`].
//!
//! Provides format detection (RON/JSON/TOML) and deserialization helpers
//! used by the presets and the runner.

use std::path::{Path, PathBuf};

use platesim_core::bath::{BathConfig, RouteRule};
use platesim_core::config::PlantConfig;
use platesim_core::dwell::{DwellTable, GraceDelays, PlatingConstants};
use platesim_core::error::ConfigError;
use platesim_core::fixed::{Fixed64, decimal_to_fixed};
use platesim_core::id::BathId;
use platesim_core::log::LogLevel;
use platesim_core::order::{DwellOverride, OrderSpec};
use platesim_core::sim::SimulationSettings;
use platesim_core::transport::TransportTiming;
use serde::de::DeserializeOwned;

use crate::schema::{
    BathData, DwellData, GraceData, OrderData, PlantData, PlatingData, SimulationData, TimingData,
};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a plant description.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// Two bath entries claim the same position.
    #[error("duplicate bath position {position} in {file}")]
    DuplicatePosition { file: PathBuf, position: u32 },

    /// A decimal field does not fit the fixed-point range.
    #[error("value of {field} in {file} is out of range")]
    OutOfRange { file: PathBuf, field: String },

    /// The resolved plant or its settings failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Loading
// ===========================================================================

/// A resolved plant description, ready to build a simulation from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPlant {
    pub config: PlantConfig,
    pub settings: SimulationSettings,
}

/// Load, resolve and validate a plant file.
pub fn load_plant_file(path: &Path) -> Result<LoadedPlant, DataLoadError> {
    let data: PlantData = deserialize_file(path)?;
    resolve(data, path)
}

/// Parse, resolve and validate an in-memory plant description.
pub fn load_plant_str(content: &str, format: Format, file: &Path) -> Result<LoadedPlant, DataLoadError> {
    let data: PlantData = deserialize_str(content, format, file)?;
    resolve(data, file)
}

/// Turn parsed data into core types and validate them.
pub fn resolve(data: PlantData, file: &Path) -> Result<LoadedPlant, DataLoadError> {
    let baths = resolve_baths(&data.baths, file)?;
    let orders = data
        .orders
        .iter()
        .map(|order| resolve_order(order, file))
        .collect::<Result<Vec<_>, _>>()?;

    let mut config = PlantConfig::new(data.name, baths, BathId(data.transport_start));
    config.carriers = data.carriers;
    config.orders = orders;
    config.scheduler = data.scheduler;
    config.timing = resolve_timing(&data.timing);
    config.dwell = resolve_dwell(&data.dwell);
    config.grace = resolve_grace(&data.grace);
    config.plating = resolve_plating(&data.plating, file)?;
    if let Some(placement) = data.placement {
        config.placement = placement;
    }
    if let Some(capacity) = data.event_capacity {
        config.event_capacity = capacity;
    }
    config.validate()?;

    let settings = resolve_settings(&data.simulation);
    settings.validate()?;

    Ok(LoadedPlant { config, settings })
}

// ===========================================================================
// Resolution helpers
// ===========================================================================

/// Highest bath position a plant file may use.
pub const MAX_POSITION: u32 = 4096;

/// Lay baths out by position. Position 0 and any gaps become disabled slots.
fn resolve_baths(data: &[BathData], file: &Path) -> Result<Vec<BathConfig>, DataLoadError> {
    if let Some(bath) = data.iter().find(|b| b.position > MAX_POSITION) {
        return Err(DataLoadError::OutOfRange {
            file: file.to_path_buf(),
            field: format!("bath position {}", bath.position),
        });
    }
    let len = data.iter().map(|b| b.position as usize + 1).max().unwrap_or(1);
    let mut baths = vec![BathConfig::disabled(); len];
    let mut seen = vec![false; len];

    for bath in data {
        let index = bath.position as usize;
        if seen[index] {
            return Err(DataLoadError::DuplicatePosition {
                file: file.to_path_buf(),
                position: bath.position,
            });
        }
        seen[index] = true;
        baths[index] = BathConfig {
            name: bath.name.clone(),
            enabled: bath.enabled,
            bath_type: bath.kind,
            priority: bath.priority,
            drain: bath.drain,
            routes: bath
                .routes
                .iter()
                .map(|r| RouteRule {
                    processes: r.processes.clone(),
                    candidates: r.to.iter().map(|&p| BathId(p)).collect(),
                })
                .collect(),
        };
    }
    Ok(baths)
}

fn to_fixed(value: f64, field: impl Into<String>, file: &Path) -> Result<Fixed64, DataLoadError> {
    decimal_to_fixed(value).ok_or_else(|| DataLoadError::OutOfRange {
        file: file.to_path_buf(),
        field: field.into(),
    })
}

fn resolve_order(order: &OrderData, file: &Path) -> Result<OrderSpec, DataLoadError> {
    let silver_mass = to_fixed(
        order.silver_mass,
        format!("order {} silver_mass", order.number),
        file,
    )?;
    let copper_mass = order
        .copper_mass
        .map(|m| to_fixed(m, format!("order {} copper_mass", order.number), file))
        .transpose()?;
    Ok(OrderSpec {
        number: order.number.clone(),
        material: order.material.clone(),
        process: order.process,
        silver_mass,
        copper_mass,
        quantity: order.quantity,
        overrides: order
            .overrides
            .iter()
            .map(|o| DwellOverride {
                bath_type: o.kind,
                seconds: o.seconds,
            })
            .collect(),
    })
}

fn resolve_timing(data: &TimingData) -> TransportTiming {
    let d = TransportTiming::default();
    TransportTiming {
        drain: data.drain.unwrap_or(d.drain),
        pick: data.pick.unwrap_or(d.pick),
        drop: data.drop.unwrap_or(d.drop),
        accelerate: data.accelerate.unwrap_or(d.accelerate),
        middle: data.middle.unwrap_or(d.middle),
        decelerate: data.decelerate.unwrap_or(d.decelerate),
        contiguous: data.contiguous.unwrap_or(d.contiguous),
    }
}

fn resolve_dwell(data: &DwellData) -> DwellTable {
    let mut table = DwellTable::default();
    for entry in &data.standard {
        table.standard.insert(entry.kind, entry.seconds);
    }
    if let Some(unlisted) = data.unlisted {
        table.unlisted = unlisted;
    }
    table
}

fn resolve_grace(data: &GraceData) -> GraceDelays {
    let d = GraceDelays::default();
    GraceDelays {
        transport: data.transport.unwrap_or(d.transport),
        empty_carrier: data.empty_carrier.unwrap_or(d.empty_carrier),
    }
}

fn resolve_plating(data: &PlatingData, file: &Path) -> Result<PlatingConstants, DataLoadError> {
    let d = PlatingConstants::default();
    let field = |value: Option<f64>, default: Fixed64, name: &str| match value {
        Some(v) => to_fixed(v, format!("plating.{name}"), file),
        None => Ok(default),
    };
    Ok(PlatingConstants {
        silver_current: field(data.silver_current, d.silver_current, "silver_current")?,
        copper_current: field(data.copper_current, d.copper_current, "copper_current")?,
        silver_deposition: field(
            data.silver_deposition,
            d.silver_deposition,
            "silver_deposition",
        )?,
    })
}

fn resolve_settings(data: &SimulationData) -> SimulationSettings {
    let d = SimulationSettings::default();
    SimulationSettings {
        speed: data.speed.unwrap_or(d.speed),
        max_time: data.max_time.unwrap_or(d.max_time),
        step: data.step.unwrap_or(d.step),
        verbosity: if data.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Standard
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platesim_core::bath::BathType;
    use platesim_core::order::ProcessType;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "platesim_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const SMALL_RON: &str = r##"#![enable(implicit_some)]
(
    name: "small",
    transport_start: 3,
    baths: [
        (position: 1, name: "silver", kind: Silver, routes: [(processes: [Silver], to: [3])]),
        (position: 2, name: "parking", kind: Parking, routes: [(processes: [PlantFilling], to: [3])]),
        (position: 3, name: "load", kind: LoadPoint, drain: 30, routes: [(processes: [Silver], to: [1])]),
    ],
    carriers: [1],
    orders: [
        (number: "1", process: Silver, silver_mass: 1.0, quantity: 1000,
         overrides: [(kind: LoadPoint, seconds: 60)]),
    ],
    timing: (pick: 10),
    simulation: (step: 1, verbose: true),
)
"##;

    const SMALL_JSON: &str = r#"{
        "name": "small",
        "transport_start": 3,
        "baths": [
            {"position": 1, "kind": "Silver", "routes": [{"processes": ["Silver"], "to": [3]}]},
            {"position": 3, "kind": "LoadPoint", "routes": [{"processes": ["Silver"], "to": [1]}]}
        ],
        "carriers": [1],
        "orders": [{"number": "1", "process": "Silver", "silver_mass": 1.0, "quantity": 1000}]
    }"#;

    const SMALL_TOML: &str = r#"
name = "small"
transport_start = 3
carriers = [1]

[[baths]]
position = 1
kind = "Silver"
routes = [{ processes = ["Silver"], to = [3] }]

[[baths]]
position = 3
kind = "LoadPoint"
routes = [{ processes = ["Silver"], to = [1] }]

[[orders]]
number = "1"
process = "Silver"
silver_mass = 1.0
quantity = 1000

[plating]
silver_current = 35.0
"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("line.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("line.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("line.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        assert!(matches!(
            detect_format(Path::new("line.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("line")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn ron_resolves_positions_and_overrides() {
        let loaded = load_plant_str(SMALL_RON, Format::Ron, Path::new("small.ron")).unwrap();
        let config = &loaded.config;

        assert_eq!(config.baths.len(), 4);
        assert!(!config.baths[0].enabled);
        assert_eq!(config.baths[3].bath_type, Some(BathType::LoadPoint));
        assert_eq!(config.baths[3].drain, Some(30));
        assert_eq!(config.baths[1].routes[0].candidates, vec![BathId(3)]);
        assert_eq!(config.transport_start, BathId(3));

        assert_eq!(config.orders[0].silver_mass, Fixed64::from_num(1));
        assert_eq!(config.orders[0].overrides[0].seconds, 60);
        assert_eq!(config.timing.pick, 10);
        assert_eq!(config.timing.drop, 20);

        assert_eq!(loaded.settings.step, 1);
        assert_eq!(loaded.settings.verbosity, LogLevel::Verbose);
        assert_eq!(loaded.settings.max_time, 57_600);
    }

    #[test]
    fn json_fills_gaps_with_disabled_slots() {
        let loaded = load_plant_str(SMALL_JSON, Format::Json, Path::new("small.json")).unwrap();
        let baths = &loaded.config.baths;
        assert_eq!(baths.len(), 4);
        assert!(!baths[2].enabled);
        assert_eq!(baths[2].bath_type, None);
        assert_eq!(loaded.config.orders[0].process, ProcessType::Silver);
    }

    #[test]
    fn toml_overrides_plating_constants() {
        let loaded = load_plant_str(SMALL_TOML, Format::Toml, Path::new("small.toml")).unwrap();
        assert_eq!(loaded.config.plating.silver_current, Fixed64::from_num(35));
        assert_eq!(
            loaded.config.plating.copper_current,
            PlatingConstants::default().copper_current
        );
    }

    #[test]
    fn duplicate_position_is_rejected() {
        let content = r#"(
            name: "dup",
            transport_start: 1,
            baths: [(position: 1, kind: LoadPoint), (position: 1, kind: Parking)],
            carriers: [],
        )"#;
        let err = load_plant_str(content, Format::Ron, Path::new("dup.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicatePosition { position: 1, .. }));
    }

    #[test]
    fn position_beyond_line_limit_is_rejected() {
        let content = r#"(
            name: "far",
            transport_start: 1,
            baths: [(position: 1, kind: LoadPoint), (position: 4294967295, kind: Parking)],
            carriers: [],
        )"#;
        let err = load_plant_str(content, Format::Ron, Path::new("far.ron")).unwrap_err();
        match err {
            DataLoadError::OutOfRange { field, .. } => {
                assert_eq!(field, "bath position 4294967295");
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn invalid_route_surfaces_config_error() {
        let content = r#"(
            name: "bad",
            transport_start: 2,
            baths: [
                (position: 1, kind: Silver, routes: [(processes: [Silver], to: [7])]),
                (position: 2, kind: LoadPoint),
            ],
            carriers: [1],
        )"#;
        let err = load_plant_str(content, Format::Ron, Path::new("bad.ron")).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Config(ConfigError::UnknownRouteTarget { .. })
        ));
    }

    #[test]
    fn zero_step_is_rejected() {
        let content = r#"(
            name: "step",
            transport_start: 1,
            baths: [(position: 1, kind: LoadPoint)],
            carriers: [],
            simulation: (step: Some(0)),
        )"#;
        let err = load_plant_str(content, Format::Ron, Path::new("step.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::Config(ConfigError::ZeroStep)));
    }

    #[test]
    fn out_of_range_mass_is_rejected() {
        let content = r#"(
            name: "mass",
            transport_start: 1,
            baths: [(position: 1, kind: LoadPoint)],
            carriers: [],
            orders: [(number: "x", process: Silver, silver_mass: 1e12, quantity: 1)],
        )"#;
        let err = load_plant_str(content, Format::Ron, Path::new("mass.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::OutOfRange { .. }));
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    #[test]
    fn load_plant_file_reads_from_disk() {
        let dir = make_test_dir("load_ron");
        let path = dir.join("small.ron");
        fs::write(&path, SMALL_RON).unwrap();

        let loaded = load_plant_file(&path).unwrap();
        assert_eq!(loaded.config.name, "small");

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result = load_plant_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_plant_file(Path::new("/nonexistent/platesim/line.toml"));
        assert!(matches!(result, Err(DataLoadError::Io(_))));
    }

    #[test]
    fn error_display_messages() {
        let err = DataLoadError::DuplicatePosition {
            file: PathBuf::from("line.ron"),
            position: 4,
        };
        assert_eq!(err.to_string(), "duplicate bath position 4 in line.ron");

        let err = DataLoadError::from(ConfigError::ZeroStep);
        assert_eq!(err.to_string(), ConfigError::ZeroStep.to_string());
    }
}
