pub mod loader;
pub mod presets;
pub mod schema;

pub use loader::{DataLoadError, Format, LoadedPlant, load_plant_file, load_plant_str};
