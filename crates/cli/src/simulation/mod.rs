//! Synthetic traffic simulation module.

mod orchestrator;
mod stats;

pub use orchestrator::{Simulation, SimulationConfig};
pub use stats::RunStats;
