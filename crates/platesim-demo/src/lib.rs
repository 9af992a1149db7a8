//! Text runner for the plating line simulation: loads a plant, drives it to
//! its maximum time and prints snapshots along the way.

pub mod error;
pub mod render;
pub mod runner;

pub use error::DemoError;
pub use render::TextRenderer;
pub use runner::{PlantSource, RunOptions, RunReport};
