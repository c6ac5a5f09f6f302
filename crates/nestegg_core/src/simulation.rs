//! Simulation loop
//!
//! Validates inputs, steps year by year and summarises the rows. A failed
//! year does not stop the run unless the household asks for it with
//! `stop_on_fail`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SimulationError};
use crate::model::{Household, SimulationResult, SimulationSummary, Strategy, TaxConfig};
use crate::simulation_state::SimulationState;
use crate::year_step::{YearContext, step_year};

/// Run one deterministic projection with the household's strategy
pub fn simulate(household: &Household, config: &TaxConfig) -> Result<SimulationResult> {
    config.validate()?;
    household.validate()?;

    let cx = YearContext::new(household, config)?;
    let mut state = SimulationState::from_household(household);
    let horizon = household.horizon_years();

    tracing::debug!(
        strategy = %household.strategy,
        start_year = household.start_year,
        horizon,
        people = cx.people.len(),
        "simulation started"
    );

    for _ in 0..horizon {
        let year = state.year;
        let row = step_year(&cx, &mut state).map_err(|source| SimulationError::YearStep {
            year,
            source: Box::new(source),
        })?;
        let failed = !row.plan_success;
        state.years.push(row);

        if failed && household.stop_on_fail {
            tracing::info!(year, "stopping at first failed year");
            break;
        }
        state.advance_year();
    }

    let summary = SimulationSummary::from_years(&state.years);
    Ok(SimulationResult {
        strategy: household.strategy,
        years: state.years,
        summary,
    })
}

/// Run the same household under several strategies.
///
/// Each run owns its own state; results come back in the order given.
pub fn simulate_strategies(
    household: &Household,
    config: &TaxConfig,
    strategies: &[Strategy],
) -> Vec<(Strategy, Result<SimulationResult>)> {
    let run = |strategy: &Strategy| {
        let mut household = household.clone();
        household.strategy = *strategy;
        (*strategy, simulate(&household, config))
    };

    #[cfg(feature = "parallel")]
    let results = strategies.par_iter().map(run).collect();

    #[cfg(not(feature = "parallel"))]
    let results = strategies.iter().map(run).collect();

    results
}
