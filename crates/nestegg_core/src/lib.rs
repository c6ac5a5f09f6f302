//! Canadian retirement projection engine
//!
//! This crate projects a household's retirement finances year by year:
//! - Federal and provincial income tax with credits, dividend gross-up,
//!   capital-gains inclusion, OAS recovery and pension income splitting
//! - RRSP to RRIF conversion and the RRIF minimum schedule
//! - TFSA room, non-registered ACB and distributions, corporate holdings
//! - CPP/QPP, OAS and GIS
//! - Strategy-driven withdrawal planning against an after-tax spending target
//!
//! The engine is deterministic and does no I/O. Hosts hand it a
//! [`model::Household`] and a [`model::TaxConfig`] and get back one
//! [`model::YearResult`] per year plus a summary.
//!
//! ```ignore
//! use nestegg_core::model::TaxConfig;
//! use nestegg_core::simulation::simulate;
//!
//! let result = simulate(&household, &TaxConfig::canada_2025())?;
//! println!("funded {} of {} years", result.summary.years_funded, result.summary.years_simulated);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod benefits;
pub mod error;
pub mod planner;
pub mod simulation;
pub mod simulation_state;
pub mod strategy;
pub mod taxes;
pub mod year_step;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;
