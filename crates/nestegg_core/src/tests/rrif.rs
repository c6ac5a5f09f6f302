//! RRSP conversion and RRIF minimum tests

use crate::config::{HouseholdBuilder, PersonBuilder};
use crate::model::{Province, RrifMinimumTable, Strategy, TaxConfig};
use crate::simulation::simulate;

// ============================================================================
// Table
// ============================================================================

#[test]
fn test_table_matches_regulator_values() {
    let table = RrifMinimumTable::canada_2025();
    assert_eq!(table.factor_for_age(71), 0.0528, "Age 71 factor should be 5.28%");
    assert_eq!(table.factor_for_age(80), 0.0682, "Age 80 factor should be 6.82%");
    assert_eq!(table.factor_for_age(90), 0.1192, "Age 90 factor should be 11.92%");
    assert_eq!(table.factor_for_age(95), 0.20, "Age 95 factor should be 20%");
    assert_eq!(table.factor_for_age(99), 0.20, "Ages past 95 stay at 20%");
}

#[test]
fn test_minimum_below_71_uses_formula() {
    let table = RrifMinimumTable::canada_2025();
    let min = table.minimum_withdrawal(67, 350_000.0);
    assert!((min - 350_000.0 / 23.0).abs() < 1e-9);
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn test_rrsp_converts_at_71() {
    let household = HouseholdBuilder::new(
        PersonBuilder::new("Pat", 70)
            .rrsp(300_000.0)
            .nonreg(1_000_000.0, 1_000_000.0),
    )
    .province(Province::ON)
    .strategy(Strategy::MinimizeIncome)
    .spending(30_000.0)
    .end_age(73)
    .build();

    let result = simulate(&household, &TaxConfig::canada_2025()).unwrap();
    let age_70 = &result.years[0];
    assert_eq!(age_70.rrif_withdrawal_p1, 0.0, "no minimum before conversion");
    assert_eq!(age_70.rrsp_end_p1, 300_000.0);
    assert_eq!(age_70.rrif_end_p1, 0.0);

    let age_71 = &result.years[1];
    assert_eq!(age_71.rrsp_end_p1, 0.0, "RRSP is converted on January 1 of the 71 year");
    assert!((age_71.rrif_minimum_p1 - 0.0528 * 300_000.0).abs() < 1e-6);
    assert!(age_71.rrif_withdrawal_p1 >= age_71.rrif_minimum_p1 - 1e-6);
}

#[test]
fn test_minimum_enforced_when_strategy_prefers_tfsa() {
    let household = HouseholdBuilder::new(
        PersonBuilder::new("Pat", 72)
            .rrif(500_000.0)
            .tfsa(1_000_000.0),
    )
    .province(Province::BC)
    .strategy(Strategy::TfsaFirst)
    .spending(20_000.0)
    .end_age(80)
    .build();

    let result = simulate(&household, &TaxConfig::canada_2025()).unwrap();
    for year in &result.years {
        assert!(
            year.rrif_withdrawal_p1 >= year.rrif_minimum_p1 - 1e-6,
            "{}: withdrew {} below minimum {}",
            year.year,
            year.rrif_withdrawal_p1,
            year.rrif_minimum_p1
        );
        assert!(year.rrif_minimum_p1 > 0.0);
    }
    assert!((result.years[0].rrif_minimum_p1 - 0.0540 * 500_000.0).abs() < 1e-6);
}

#[test]
fn test_early_conversion_replaces_71() {
    let household = HouseholdBuilder::new(
        PersonBuilder::new("Pat", 60)
            .rrsp(200_000.0)
            .tfsa(200_000.0)
            .early_rrif_percentage(62, 64, 0.10),
    )
    .province(Province::ON)
    .strategy(Strategy::TfsaFirst)
    .spending(10_000.0)
    .end_age(66)
    .build();

    let result = simulate(&household, &TaxConfig::canada_2025()).unwrap();
    assert_eq!(result.years[0].rrif_withdrawal_p1, 0.0);
    assert_eq!(result.years[1].rrif_withdrawal_p1, 0.0);
    let age_62 = &result.years[2];
    assert_eq!(age_62.rrsp_end_p1, 0.0);
    assert!((age_62.rrif_withdrawal_p1 - 20_000.0).abs() < 1e-6, "10% of 200,000");
    // Once converted the minimum keeps applying after the elective window
    let age_65 = &result.years[5];
    assert!(age_65.rrif_minimum_p1 > 0.0);
    assert!(age_65.rrif_withdrawal_p1 >= age_65.rrif_minimum_p1 - 1e-6);
}
