//! Regulator schedules: RRIF minimum factors and public pension start-age scaling
//!
//! The RRIF factor table is supplied by configuration and used exactly as given.
//! Ages below the first entry fall back to the regulator formula `1 / (90 - age)`;
//! ages past the last entry keep the last factor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Age at which RRSP balances must have been converted
pub const RRIF_CONVERSION_AGE: u32 = 71;

/// Last age that must appear in a configured RRIF table
pub const RRIF_TABLE_LAST_AGE: u32 = 95;

pub const OAS_EARLIEST_START: u32 = 65;
pub const OAS_LATEST_START: u32 = 70;
pub const CPP_EARLIEST_START: u32 = 60;
pub const CPP_LATEST_START: u32 = 70;

/// Per-year deferral increase for OAS (0.6% per month)
const OAS_DEFERRAL_PER_YEAR: f64 = 0.072;
/// Per-year reduction for taking CPP before 65 (0.6% per month)
const CPP_EARLY_REDUCTION_PER_YEAR: f64 = 0.072;
/// Per-year increase for taking CPP after 65 (0.7% per month)
const CPP_DEFERRAL_PER_YEAR: f64 = 0.084;

/// RRIF minimum withdrawal factors keyed by age on January 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RrifMinimumTable {
    factors: BTreeMap<u32, f64>,
}

impl RrifMinimumTable {
    #[must_use]
    pub fn new(factors: BTreeMap<u32, f64>) -> Self {
        Self { factors }
    }

    /// Prescribed factors for ages 71 through 95+
    #[must_use]
    pub fn canada_2025() -> Self {
        let factors = [
            (71, 0.0528),
            (72, 0.0540),
            (73, 0.0553),
            (74, 0.0567),
            (75, 0.0582),
            (76, 0.0598),
            (77, 0.0617),
            (78, 0.0636),
            (79, 0.0658),
            (80, 0.0682),
            (81, 0.0708),
            (82, 0.0738),
            (83, 0.0771),
            (84, 0.0808),
            (85, 0.0851),
            (86, 0.0899),
            (87, 0.0955),
            (88, 0.1021),
            (89, 0.1099),
            (90, 0.1192),
            (91, 0.1306),
            (92, 0.1449),
            (93, 0.1634),
            (94, 0.1879),
            (95, 0.2000),
        ];
        Self {
            factors: factors.into_iter().collect(),
        }
    }

    /// Minimum withdrawal factor for a person of `age` on January 1
    #[must_use]
    pub fn factor_for_age(&self, age: u32) -> f64 {
        if let Some(factor) = self.factors.get(&age) {
            return *factor;
        }

        let first = self.factors.first_key_value();
        let last = self.factors.last_key_value();
        match (first, last) {
            (Some((&first_age, _)), _) if age < first_age => {
                if age < 90 {
                    1.0 / f64::from(90 - age)
                } else {
                    1.0
                }
            }
            (_, Some((&last_age, &factor))) if age > last_age => factor,
            // Inside the table but missing: use the nearest younger entry
            _ => self
                .factors
                .range(..age)
                .next_back()
                .map(|(_, f)| *f)
                .unwrap_or(0.0),
        }
    }

    /// Mandatory minimum for the year given the January 1 balance
    #[must_use]
    pub fn minimum_withdrawal(&self, age: u32, start_balance: f64) -> f64 {
        if start_balance <= 0.0 {
            return 0.0;
        }
        (self.factor_for_age(age) * start_balance).min(start_balance)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for age in RRIF_CONVERSION_AGE..=RRIF_TABLE_LAST_AGE {
            match self.factors.get(&age) {
                Some(f) if f.is_finite() && (0.0..=1.0).contains(f) => {}
                Some(&value) => {
                    return Err(ConfigError::InvalidRate {
                        field: format!("rrif_minimum.{age}"),
                        value,
                    });
                }
                None => return Err(ConfigError::RrifTableGap { age }),
            }
        }
        Ok(())
    }
}

/// Multiplier applied to the age-65 OAS amount when the start is deferred
#[must_use]
pub fn oas_deferral_factor(start_age: u32) -> f64 {
    let start = clamp_oas_start(start_age);
    1.0 + OAS_DEFERRAL_PER_YEAR * f64::from(start - OAS_EARLIEST_START)
}

/// OAS cannot start before 65 or be deferred past 70
#[must_use]
pub fn clamp_oas_start(start_age: u32) -> u32 {
    start_age.clamp(OAS_EARLIEST_START, OAS_LATEST_START)
}

/// Multiplier applied to the age-65 CPP/QPP amount for an early or late start
#[must_use]
pub fn cpp_start_factor(start_age: u32) -> f64 {
    let start = start_age.clamp(CPP_EARLIEST_START, CPP_LATEST_START);
    if start < 65 {
        1.0 - CPP_EARLY_REDUCTION_PER_YEAR * f64::from(65 - start)
    } else {
        1.0 + CPP_DEFERRAL_PER_YEAR * f64::from(start - 65)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoints() {
        let table = RrifMinimumTable::canada_2025();
        assert_eq!(table.factor_for_age(71), 0.0528);
        assert_eq!(table.factor_for_age(95), 0.20);
        assert_eq!(table.factor_for_age(101), 0.20, "95+ keeps the last factor");
        assert_eq!(table.validate(), Ok(()));
    }

    #[test]
    fn test_formula_below_71() {
        let table = RrifMinimumTable::canada_2025();
        assert!((table.factor_for_age(65) - 0.04).abs() < 1e-12);
        assert!((table.factor_for_age(70) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_minimum_withdrawal() {
        let table = RrifMinimumTable::canada_2025();
        let min = table.minimum_withdrawal(71, 100_000.0);
        assert!((min - 5_280.0).abs() < 1e-6);
        assert_eq!(table.minimum_withdrawal(80, 0.0), 0.0);
    }

    #[test]
    fn test_gap_detected() {
        let mut factors: BTreeMap<u32, f64> = RrifMinimumTable::canada_2025().factors;
        factors.remove(&80);
        let table = RrifMinimumTable::new(factors);
        assert_eq!(table.validate(), Err(ConfigError::RrifTableGap { age: 80 }));
        // Lookup still works by falling back to the previous age
        assert_eq!(table.factor_for_age(80), 0.0658);
    }

    #[test]
    fn test_public_pension_scaling() {
        assert_eq!(oas_deferral_factor(65), 1.0);
        assert!((oas_deferral_factor(70) - 1.36).abs() < 1e-12);
        assert!((oas_deferral_factor(75) - 1.36).abs() < 1e-12, "clamped at 70");
        assert_eq!(clamp_oas_start(60), 65);
        assert!((cpp_start_factor(60) - 0.64).abs() < 1e-12);
        assert!((cpp_start_factor(70) - 1.42).abs() < 1e-12);
    }
}
