//! Scenario files
//!
//! A scenario is a household plus an optional tax configuration:
//!
//! ```yaml
//! household:
//!   p1: { name: Rafael, start_age: 67, rrif: 350000 }
//!   province: AB
//!   start_year: 2033
//!   strategy: rrif-frontload
//!   spending_go_go: 60000
//! tax_config: ...   # optional, defaults to the 2025 Canadian tables
//! ```
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.

use std::fs;
use std::path::{Path, PathBuf};

use nestegg_core::model::{Household, TaxConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum InputFileError {
    /// The file could not be read
    Io { path: PathBuf, message: String },
    /// The file was read but is not a valid document
    Parse { path: PathBuf, message: String },
}

impl std::fmt::Display for InputFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFileError::Io { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            InputFileError::Parse { path, message } => {
                write!(f, "cannot parse {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for InputFileError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub household: Household,
    #[serde(default)]
    pub tax_config: Option<TaxConfig>,
}

impl ScenarioFile {
    /// Tax configuration from the file, or the built-in 2025 tables
    #[must_use]
    pub fn tax_config_or_default(&self) -> TaxConfig {
        self.tax_config
            .clone()
            .unwrap_or_else(TaxConfig::canada_2025)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read and deserialize a YAML or JSON document
fn load_document<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, InputFileError> {
    let content = fs::read_to_string(path).map_err(|e| InputFileError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let parsed = if is_json(path) {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_saphyr::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| InputFileError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn load_scenario(path: &Path) -> Result<ScenarioFile, InputFileError> {
    let scenario: ScenarioFile = load_document(path)?;
    tracing::debug!(
        path = %path.display(),
        strategy = %scenario.household.strategy,
        custom_tax_config = scenario.tax_config.is_some(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// A standalone tax configuration document, used by `--tax-config`
pub fn load_tax_config(path: &Path) -> Result<TaxConfig, InputFileError> {
    load_document(path)
}
