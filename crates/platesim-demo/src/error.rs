/// Errors that can stop the runner before or during a run.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// The plant file could not be loaded.
    #[error(transparent)]
    Load(#[from] platesim_data::DataLoadError),

    /// The plant or settings were rejected when building the simulation.
    #[error(transparent)]
    Config(#[from] platesim_core::error::ConfigError),

    /// No built-in preset has this name.
    #[error("unknown preset '{name}', expected one of {known:?}")]
    UnknownPreset {
        name: String,
        known: &'static [&'static str],
    },

    /// Writing the rendered output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
