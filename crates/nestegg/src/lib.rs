//! Command-line host for the nestegg retirement projection engine
//!
//! Loads a scenario file, runs [`nestegg_core`] and renders the result as a
//! table or JSON. All file and terminal I/O lives here; the core stays pure.

#![warn(clippy::all)]

pub mod input;
pub mod logging;
pub mod report;

#[cfg(test)]
mod tests;

pub use input::{InputFileError, ScenarioFile, load_scenario, load_tax_config};
pub use logging::{default_log_path, init_logging};
pub use report::OutputFormat;
