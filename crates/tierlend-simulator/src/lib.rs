//! # Tierlend Simulator
//!
//! Command-line front end: loads configuration, keeps prices fresh with the
//! reconciler, and prints loan projections for a borrower score.

pub mod cli;
pub mod config;
pub mod report;

pub use cli::Cli;
pub use config::SimulatorConfig;
