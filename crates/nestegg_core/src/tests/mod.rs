//! Integration tests for the projection engine
//!
//! Tests are organized by topic:
//! - `taxes` - Brackets, credits, dividends, OAS recovery, abatement
//! - `benefits` - CPP/QPP and OAS start rules, GIS clawback
//! - `rrif` - Conversion and the minimum withdrawal schedule
//! - `planner` - Gross-up solver, pension splitting, surplus handling
//! - `strategies` - Source ordering for each withdrawal strategy
//! - `scenarios` - End-to-end households
//! - `properties` - Property-based invariants

mod benefits;
mod properties;
mod rrif;
