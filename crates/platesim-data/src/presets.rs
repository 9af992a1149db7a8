//! Plant descriptions compiled into the binary.

use std::path::Path;

use crate::loader::{DataLoadError, Format, LoadedPlant, load_plant_str};

const SILVER_LINE: &str = include_str!("../data/silver_line.ron");

/// Names accepted by [`by_name`].
pub const PRESETS: &[&str] = &["silver_line"];

/// The 31-position silver line with eight drums and its production backlog.
pub fn silver_line() -> Result<LoadedPlant, DataLoadError> {
    load_plant_str(SILVER_LINE, Format::Ron, Path::new("silver_line.ron"))
}

/// Look up a preset by name.
pub fn by_name(name: &str) -> Option<Result<LoadedPlant, DataLoadError>> {
    match name {
        "silver_line" => Some(silver_line()),
        _ => None,
    }
}
