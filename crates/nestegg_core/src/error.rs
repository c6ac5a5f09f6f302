use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Province;

/// Errors in the tax configuration document. Detected before the first year runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingProvince(Province),
    EmptyBrackets {
        jurisdiction: String,
    },
    MalformedBracket {
        jurisdiction: String,
        index: usize,
        reason: &'static str,
    },
    InvalidRate {
        field: String,
        value: f64,
    },
    RrifTableGap {
        age: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingProvince(p) => {
                write!(f, "no tax block configured for province {}", p.code())
            }
            ConfigError::EmptyBrackets { jurisdiction } => {
                write!(f, "{jurisdiction}: bracket table is empty")
            }
            ConfigError::MalformedBracket {
                jurisdiction,
                index,
                reason,
            } => write!(f, "{jurisdiction}: bracket {index} is malformed: {reason}"),
            ConfigError::InvalidRate { field, value } => {
                write!(f, "{field} must be a finite rate in [0, 1], got {value}")
            }
            ConfigError::RrifTableGap { age } => {
                write!(f, "rrif_minimum table has no factor for age {age}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors in the household description
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    NegativeBalance {
        person: String,
        account: &'static str,
        value: f64,
    },
    NonFinite {
        field: String,
    },
    AgeOrdering {
        field: &'static str,
        reason: String,
    },
    MissingPartner,
    MissingDividendType {
        person: String,
    },
    UnknownStrategy(String),
    UnknownProvince(String),
    InvalidFraction {
        field: String,
        value: f64,
    },
    UnknownOwner {
        stream: String,
        owner: usize,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NegativeBalance {
                person,
                account,
                value,
            } => write!(f, "{person}: {account} balance is negative ({value})"),
            InputError::NonFinite { field } => write!(f, "{field} is not a finite number"),
            InputError::AgeOrdering { field, reason } => {
                write!(f, "invalid age ordering for {field}: {reason}")
            }
            InputError::MissingPartner => {
                write!(f, "include_partner is set but no second person was given")
            }
            InputError::MissingDividendType { person } => write!(
                f,
                "{person}: corporate balance given without corp_dividend_type (eligible or non_eligible)"
            ),
            InputError::UnknownStrategy(name) => write!(f, "unknown strategy '{name}'"),
            InputError::UnknownProvince(code) => write!(f, "unknown province '{code}'"),
            InputError::InvalidFraction { field, value } => {
                write!(f, "{field} must be within [0, 1], got {value}")
            }
            InputError::UnknownOwner { stream, owner } => {
                write!(f, "income stream '{stream}' refers to missing person #{owner}")
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Top-level error returned by the simulation entry points
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(ConfigError),
    Input(InputError),
    /// A year could not be computed; the whole run is abandoned
    YearStep {
        year: i32,
        source: Box<SimulationError>,
    },
    /// Non-finite or otherwise impossible intermediate value
    Internal(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "configuration error: {e}"),
            SimulationError::Input(e) => write!(f, "input error: {e}"),
            SimulationError::YearStep { year, source } => write!(f, "year {year}: {source}"),
            SimulationError::Internal(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Input(e) => Some(e),
            SimulationError::YearStep { source, .. } => Some(source.as_ref()),
            SimulationError::Internal(_) => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

impl From<InputError> for SimulationError {
    fn from(e: InputError) -> Self {
        SimulationError::Input(e)
    }
}

impl SimulationError {
    /// Short machine-readable category
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::Config(_) | SimulationError::Internal(_) => "configuration",
            SimulationError::Input(_) => "input",
            SimulationError::YearStep { source, .. } => source.kind(),
        }
    }

    fn year(&self) -> Option<i32> {
        match self {
            SimulationError::YearStep { year, .. } => Some(*year),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Structured error handed to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub success: bool,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&SimulationError> for ErrorRecord {
    fn from(err: &SimulationError) -> Self {
        let message = err.to_string().replace('\n', " ");
        let details = serde_json::json!({
            "kind": err.kind(),
            "year": err.year(),
            "debug": format!("{err:?}"),
        });
        ErrorRecord {
            success: false,
            message,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_is_single_line() {
        let err = SimulationError::YearStep {
            year: 2031,
            source: Box::new(SimulationError::Internal("net tax\nis NaN".into())),
        };
        let record = ErrorRecord::from(&err);
        assert!(!record.success);
        assert!(!record.message.contains('\n'));
        assert_eq!(record.details["year"], 2031);
        assert_eq!(record.details["kind"], "configuration");
    }

    #[test]
    fn test_input_error_message() {
        let err: SimulationError = InputError::UnknownStrategy("yolo".into()).into();
        assert_eq!(err.to_string(), "input error: unknown strategy 'yolo'");
        assert_eq!(err.kind(), "input");
    }
}
