use std::fs;
use std::path::PathBuf;

use nestegg_core::model::{Province, Strategy, TaxConfig};
use nestegg_core::simulation::simulate;
use tempfile::tempdir;

use crate::input::{InputFileError, load_scenario, load_tax_config};

const MINIMAL_YAML: &str = "\
household:
  p1:
    name: Pat
    start_age: 66
    tfsa: 50000
  province: BC
  start_year: 2026
  strategy: tfsa-first
  spending_go_go: 20000
";

fn bundled(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_load_minimal_yaml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pat.yaml");
    fs::write(&path, MINIMAL_YAML).unwrap();

    let scenario = load_scenario(&path).unwrap();
    let household = &scenario.household;
    assert_eq!(household.p1.name, "Pat");
    assert_eq!(household.province, Province::BC);
    assert_eq!(household.strategy, Strategy::TfsaFirst);
    assert_eq!(household.end_age, 95, "default end age");
    assert_eq!(household.gap_tolerance, 100.0, "default gap tolerance");
    assert!(scenario.tax_config.is_none());
    assert_eq!(scenario.tax_config_or_default(), TaxConfig::canada_2025());
}

#[test]
fn test_load_json_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pat.json");
    let json = r#"{
        "household": {
            "p1": { "name": "Pat", "start_age": 70, "rrif": 100000 },
            "province": "ON",
            "start_year": 2025,
            "strategy": "minimize-income",
            "spending_go_go": 15000
        }
    }"#;
    fs::write(&path, json).unwrap();

    let scenario = load_scenario(&path).unwrap();
    assert_eq!(scenario.household.p1.rrif, 100_000.0);
    assert_eq!(scenario.household.strategy, Strategy::MinimizeIncome);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_scenario(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, InputFileError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_unknown_strategy_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, MINIMAL_YAML.replace("tfsa-first", "spend-it-all")).unwrap();

    let err = load_scenario(&path).unwrap_err();
    assert!(matches!(err, InputFileError::Parse { .. }), "got {err}");
}

#[test]
fn test_tax_config_round_trips_through_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tax.json");
    let config = TaxConfig::canada_2025();
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = load_tax_config(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_bundled_scenarios_run() {
    for name in ["rafael.yaml", "juan_daniela.yaml", "early_rrif.yaml"] {
        let scenario = load_scenario(&bundled(name))
            .unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
        let result = simulate(&scenario.household, &scenario.tax_config_or_default())
            .unwrap_or_else(|e| panic!("{name} failed to simulate: {e}"));
        assert!(!result.years.is_empty(), "{name} produced no rows");
    }
}

#[test]
fn test_bundled_couple_is_a_couple() {
    let scenario = load_scenario(&bundled("juan_daniela.yaml")).unwrap();
    assert!(scenario.household.is_couple());
    assert_eq!(scenario.household.strategy, Strategy::CorporateOptimized);
}
