pub mod config;
pub mod output;
pub mod simulation;

pub use simulation::*;
pub use config::*;
