//! Public benefits: CPP/QPP, OAS and the Guaranteed Income Supplement

use crate::model::{GisParams, Person, clamp_oas_start};

/// Growth multiplier for `years` of compounding; negative years deflate
#[must_use]
pub fn inflation_factor(rate: f64, years: i32) -> f64 {
    (1.0 + rate).powi(years)
}

/// CPP/QPP paid in a year. `years_elapsed` counts from the simulation start year.
#[must_use]
pub fn cpp_for_year(person: &Person, age: u32, years_elapsed: i32, inflation: f64) -> f64 {
    if age >= person.cpp_start_age {
        person.cpp_annual_at_start * inflation_factor(inflation, years_elapsed)
    } else {
        0.0
    }
}

/// OAS paid in a year; the start age is clamped to 65..=70
#[must_use]
pub fn oas_for_year(person: &Person, age: u32, years_elapsed: i32, inflation: f64) -> f64 {
    if age >= clamp_oas_start(person.oas_start_age) {
        person.oas_annual_at_start * inflation_factor(inflation, years_elapsed)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GisStatus {
    Single,
    Couple,
}

/// Inflated GIS threshold and maximum benefit for one year
#[must_use]
pub fn gis_schedule(params: &GisParams, status: GisStatus, year: i32, inflation: f64) -> (f64, f64) {
    let factor = inflation_factor(inflation, year - params.base_year);
    match status {
        GisStatus::Single => (
            params.threshold_single * factor,
            params.max_benefit_single * factor,
        ),
        GisStatus::Couple => (
            params.threshold_couple * factor,
            params.max_benefit_couple * factor,
        ),
    }
}

/// GIS for one recipient.
///
/// `eligible_income` is taxable income excluding OAS (combined for a couple).
/// Nothing is paid without OAS.
#[must_use]
pub fn gis_for_year(
    params: &GisParams,
    status: GisStatus,
    eligible_income: f64,
    oas: f64,
    year: i32,
    inflation: f64,
) -> f64 {
    if oas <= 0.0 {
        return 0.0;
    }
    let (threshold, max_benefit) = gis_schedule(params, status, year, inflation);
    let income = eligible_income.max(0.0);
    if income <= threshold {
        max_benefit
    } else {
        (max_benefit - (income - threshold) * params.clawback_rate).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflation_factor() {
        assert_eq!(inflation_factor(0.02, 0), 1.0);
        assert!((inflation_factor(0.02, 2) - 1.0404).abs() < 1e-12);
        assert!((inflation_factor(0.02, -1) - 1.0 / 1.02).abs() < 1e-12);
    }

    #[test]
    fn test_gis_not_paid_without_oas() {
        let params = crate::model::TaxConfig::canada_2025().gis;
        assert_eq!(gis_for_year(&params, GisStatus::Single, 0.0, 0.0, 2026, 0.0), 0.0);
    }
}
