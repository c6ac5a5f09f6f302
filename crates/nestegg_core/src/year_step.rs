//! One simulated year
//!
//! Step order matters and must not change:
//! 1. ages, inflation indexing
//! 2. RRSP to RRIF conversion
//! 3. January 1 snapshot, non-registered distributions, fixed incomes
//! 4. registered floor (RRIF minimum, early RRIF, hybrid top-up)
//! 5. spending target from the senior partner's age
//! 6. benefit/tax pass: GIS estimate, plan, GIS again, plan again
//! 7. withdrawals, then growth, then surplus reinvestment and TFSA room
//! 8. record the row

use crate::benefits::{GisStatus, cpp_for_year, gis_for_year, inflation_factor, oas_for_year};
use crate::error::{Result, SimulationError};
use crate::model::{
    DUST, Distributions, Household, IncomeKind, Person, PersonAccounts, PersonYear,
    RRIF_CONVERSION_AGE, TaxConfig, YearResult, clamp_oas_start,
};
use crate::planner::{
    Draw, HouseholdPlan, PersonInputs, PlanRequest, SourceBalances, plan_year,
};
use crate::simulation_state::SimulationState;
use crate::strategy::StrategyPlan;
use crate::taxes::{IncomeBreakdown, TaxContext, taxable_income};

/// TFSA room grants are announced in $500 increments
const TFSA_ROOM_ROUNDING: f64 = 500.0;

/// Read-only inputs shared by every year of one run
#[derive(Debug, Clone)]
pub struct YearContext<'a> {
    pub household: &'a Household,
    pub config: &'a TaxConfig,
    pub tax: TaxContext<'a>,
    pub strategy: StrategyPlan,
    pub people: Vec<&'a Person>,
}

impl<'a> YearContext<'a> {
    pub fn new(household: &'a Household, config: &'a TaxConfig) -> Result<Self> {
        Ok(Self {
            household,
            config,
            tax: TaxContext::new(config, household.province)?,
            strategy: household.strategy.plan(),
            people: household.participants(),
        })
    }
}

/// Indexed annual TFSA grant for a year, rounded to the nearest $500
#[must_use]
pub fn tfsa_room_grant(base_grant: f64, inflation: f64, years_elapsed: i32) -> f64 {
    let indexed = base_grant * inflation_factor(inflation, years_elapsed);
    (indexed / TFSA_ROOM_ROUNDING).round() * TFSA_ROOM_ROUNDING
}

/// Age at which a person's RRSP becomes a RRIF
fn conversion_age(person: &Person) -> u32 {
    match &person.early_rrif {
        Some(early) if early.enabled => early.start_age.min(RRIF_CONVERSION_AGE),
        _ => RRIF_CONVERSION_AGE,
    }
}

/// Pension and other stream income for one person
fn stream_income(household: &Household, owner: usize, age: u32, index: f64) -> (f64, f64) {
    let mut pension = 0.0;
    let mut other = 0.0;
    for stream in household.income_streams.iter().filter(|s| s.owner == owner) {
        let active = age >= stream.start_age && stream.end_age.is_none_or(|end| age <= end);
        if !active {
            continue;
        }
        let amount = if stream.indexed {
            stream.annual_amount * index
        } else {
            stream.annual_amount
        };
        match stream.kind {
            IncomeKind::Pension => pension += amount,
            IncomeKind::Other => other += amount,
        }
    }
    (pension, other)
}

/// Inflows fixed before planning, per person
#[derive(Debug, Clone, Copy, Default)]
struct FixedInflows {
    cpp: f64,
    oas: f64,
    employer_pension: f64,
    other_income: f64,
    distributions: Distributions,
    rrif_minimum: f64,
}

impl FixedInflows {
    fn taxable(&self) -> IncomeBreakdown {
        IncomeBreakdown {
            ordinary: self.cpp + self.other_income + self.distributions.interest,
            pension: self.employer_pension,
            rrif: 0.0,
            eligible_dividends: self.distributions.eligible_dividends,
            non_eligible_dividends: self.distributions.non_eligible_dividends,
            capital_gains: self.distributions.capital_gains,
            oas_received: self.oas,
        }
    }

    fn cash(&self, reinvest_distributions: bool) -> f64 {
        let distributions = if reinvest_distributions {
            0.0
        } else {
            self.distributions.total()
        };
        self.cpp + self.oas + self.employer_pension + self.other_income + distributions
    }
}

/// GIS per person given each person's GIS-eligible income (taxable income without OAS)
fn gis_for_household(
    cx: &YearContext<'_>,
    year: i32,
    eligible_income: &[f64],
    oas: &[f64],
) -> Vec<f64> {
    let household = cx.household;
    let (status, combined) = if household.is_couple() {
        (GisStatus::Couple, eligible_income.iter().sum::<f64>())
    } else {
        (GisStatus::Single, 0.0)
    };
    eligible_income
        .iter()
        .zip(oas)
        .map(|(own, oas)| {
            let income = match status {
                GisStatus::Couple => combined,
                GisStatus::Single => *own,
            };
            gis_for_year(
                &cx.config.gis,
                status,
                income,
                *oas,
                year,
                household.general_inflation,
            )
        })
        .collect()
}

fn gis_eligible(cx: &YearContext<'_>, income: &IncomeBreakdown) -> f64 {
    (taxable_income(cx.tax.federal, income) - income.oas_received).max(0.0)
}

/// Simulate the state's current year and advance nothing; the caller moves the clock.
pub fn step_year(cx: &YearContext<'_>, state: &mut SimulationState) -> Result<YearResult> {
    let household = cx.household;
    let year = state.year;
    let elapsed = state.elapsed(household);
    let index = inflation_factor(household.general_inflation, elapsed);

    let ages: Vec<u32> = cx
        .people
        .iter()
        .map(|p| p.age_in(household.start_year, year))
        .collect();

    // Conversion happens on January 1, before anything is measured
    for ((person, accounts), &age) in cx.people.iter().zip(&mut state.accounts).zip(&ages) {
        if !accounts.registered.converted && age >= conversion_age(person) {
            let moved = accounts.registered.convert();
            tracing::debug!(year, person = %person.name, age, moved, "RRSP converted to RRIF");
        }
    }

    let snapshot: Vec<PersonAccounts> = state.accounts.clone();

    let mut fixed: Vec<FixedInflows> = Vec::with_capacity(cx.people.len());
    let mut floors = Vec::with_capacity(cx.people.len());
    let mut caps = Vec::with_capacity(cx.people.len());
    for (i, (person, accounts)) in cx.people.iter().zip(&snapshot).enumerate() {
        let age = ages[i];
        let (employer_pension, other_income) = stream_income(household, i, age, index);
        let registered_start = accounts.registered.balance();

        let rrif_minimum = if accounts.registered.converted {
            cx.config
                .rrif_minimum
                .minimum_withdrawal(age, accounts.registered.rrif)
        } else {
            0.0
        };
        let early = person
            .early_rrif
            .filter(|e| e.active_at(age))
            .map(|e| e.amount(registered_start))
            .unwrap_or(0.0);
        let topup = if cx.strategy.registered_topup {
            household.hybrid_topup_amount
        } else {
            0.0
        };
        floors.push(rrif_minimum.max(early).max(topup).min(registered_start));

        // The cap follows the RRIF alone; an unconverted RRSP does not raise it
        let oas_started = age >= clamp_oas_start(person.oas_start_age);
        caps.push(
            cx.strategy
                .rrif_cap
                .map(|cap| cap.amount(accounts.registered.rrif, oas_started)),
        );

        fixed.push(FixedInflows {
            cpp: cpp_for_year(person, age, elapsed, household.general_inflation),
            oas: oas_for_year(person, age, elapsed, household.general_inflation),
            employer_pension,
            other_income,
            distributions: accounts.nonreg.buckets.distributions(&accounts.nonreg.yields),
            rrif_minimum,
        });
    }

    let senior_age = ages.iter().copied().max().unwrap_or(0);
    let target = household.base_spending_for_age(senior_age)
        * inflation_factor(household.spending_inflation, elapsed);

    let build_inputs = |gis: &[f64]| -> Vec<PersonInputs> {
        cx.people
            .iter()
            .enumerate()
            .map(|(i, person)| {
                let accounts = &snapshot[i];
                PersonInputs {
                    age: ages[i],
                    disability: person.disability,
                    fixed_income: fixed[i].taxable(),
                    fixed_cash: fixed[i].cash(household.reinvest_nonreg_dist) + gis[i],
                    registered_floor: floors[i],
                    rrif_cap: caps[i],
                    balances: SourceBalances {
                        rrif: accounts.registered.rrif,
                        rrsp: accounts.registered.rrsp,
                        tfsa: accounts.tfsa.balance,
                        nonreg: accounts.nonreg.balance(),
                        corporate: accounts.corporate.balance(),
                    },
                    gain_fraction: accounts.nonreg.gain_fraction(),
                    corporate_cda: accounts.corporate.cda,
                    dividend_type: accounts.corporate.dividend_type,
                }
            })
            .collect()
    };

    let request = PlanRequest {
        ctx: cx.tax,
        strategy: &cx.strategy,
        target,
        gap_tolerance: household.gap_tolerance,
        pension_split_max: household.pension_split_max,
    };
    let oas: Vec<f64> = fixed.iter().map(|f| f.oas).collect();

    // Preliminary GIS on non-benefit income with the registered floor drawn
    let no_gis = vec![0.0; cx.people.len()];
    let prelim_eligible: Vec<f64> = build_inputs(&no_gis)
        .iter()
        .map(|inputs| {
            let floor_draw = Draw {
                registered: inputs.registered_floor,
                ..Default::default()
            };
            gis_eligible(cx, &inputs.income_for(&floor_draw))
        })
        .collect();
    let gis_prelim = gis_for_household(cx, year, &prelim_eligible, &oas);
    let first = plan_year(&request, &build_inputs(&gis_prelim));

    let planned_eligible: Vec<f64> = first
        .people
        .iter()
        .map(|p| gis_eligible(cx, &p.income))
        .collect();
    let gis = gis_for_household(cx, year, &planned_eligible, &oas);
    let plan = if gis == gis_prelim {
        first
    } else {
        plan_year(&request, &build_inputs(&gis))
    };

    tracing::debug!(
        year,
        target,
        iterations = plan.iterations,
        gap = plan.spending_gap,
        split = plan.pension_split_fraction,
        "year planned"
    );

    let mut people = apply_plan(cx, state, &plan, &fixed, &gis, &ages)?;
    reinvest_surplus(household, state, &mut people, plan.surplus);

    let next_grant = tfsa_room_grant(
        household.tfsa_annual_room,
        household.general_inflation,
        elapsed + 1,
    );
    for (accounts, person_year) in state.accounts.iter_mut().zip(&mut people) {
        accounts.tfsa.roll_year(next_grant);
        record_balances(accounts, person_year);
    }

    let row = build_row(year, &plan, &people);
    if !row.plan_success {
        tracing::warn!(
            year,
            strategy = %household.strategy,
            gap = row.spending_gap,
            reason = row.failure_reason.as_deref().unwrap_or(""),
            "year underfunded"
        );
    }
    check_row(&row, state)?;
    Ok(row)
}

/// Take the planned withdrawals and grow what is left
fn apply_plan(
    cx: &YearContext<'_>,
    state: &mut SimulationState,
    plan: &HouseholdPlan,
    fixed: &[FixedInflows],
    gis: &[f64],
    ages: &[u32],
) -> Result<Vec<PersonYear>> {
    let household = cx.household;
    let mut people = Vec::with_capacity(plan.people.len());

    for (i, person_plan) in plan.people.iter().enumerate() {
        let accounts = state.accounts.get_mut(i).ok_or_else(|| {
            SimulationError::Internal(format!("no accounts for participant {i}"))
        })?;
        let draw = person_plan.draw;

        let (rrif_withdrawal, rrsp_withdrawal) = accounts.registered.withdraw(draw.registered);
        let tfsa_withdrawal = accounts.tfsa.withdraw(draw.tfsa);
        let sale = accounts.nonreg.withdraw(draw.nonreg);
        let payout = accounts
            .corporate
            .withdraw(draw.corporate, cx.config.corporate.dividend_refund_rate);

        accounts.registered.grow();
        accounts.tfsa.grow();
        accounts.nonreg.grow();
        accounts
            .nonreg
            .settle_distributions(&fixed[i].distributions, household.reinvest_nonreg_dist);
        accounts
            .corporate
            .accrue_year(&cx.config.corporate, cx.tax.capital_gains_inclusion());

        let tax = &person_plan.tax;
        people.push(PersonYear {
            age: ages[i],
            employer_pension: fixed[i].employer_pension,
            other_income: fixed[i].other_income,
            cpp: fixed[i].cpp,
            oas: fixed[i].oas,
            gis: gis[i],
            nonreg_distributions: fixed[i].distributions.total(),
            rrif_minimum: fixed[i].rrif_minimum,
            rrif_withdrawal,
            rrsp_withdrawal,
            tfsa_withdrawal,
            nonreg_withdrawal: sale.proceeds,
            corporate_withdrawal: payout.paid,
            realized_capital_gains: sale.capital_gain,
            taxable_income: tax.taxable_income,
            gross_tax: tax.gross_tax,
            total_tax: tax.net_tax,
            oas_clawback: tax.federal.oas_clawback,
            marginal_rate: tax.marginal_rate,
            gis_eligible_income: gis_eligible(cx, &person_plan.income),
            ..Default::default()
        });
    }
    Ok(people)
}

/// Surplus goes to TFSA room in household order, then evenly to non-registered
fn reinvest_surplus(
    household: &Household,
    state: &mut SimulationState,
    people: &mut [PersonYear],
    surplus: f64,
) {
    if surplus <= DUST || people.is_empty() {
        return;
    }
    let mut left = surplus;
    for (accounts, person_year) in state.accounts.iter_mut().zip(people.iter_mut()) {
        let accepted = accounts.tfsa.contribute(left);
        person_year.tfsa_contribution = accepted;
        left -= accepted;
    }
    if left > DUST {
        let share = left / people.len() as f64;
        for (accounts, person_year) in state.accounts.iter_mut().zip(people.iter_mut()) {
            accounts.nonreg.deposit(share);
            person_year.nonreg_contribution = share;
        }
    }
    tracing::debug!(
        year = state.year,
        strategy = %household.strategy,
        surplus,
        to_nonreg = left.max(0.0),
        "surplus reinvested"
    );
}

fn record_balances(accounts: &PersonAccounts, person_year: &mut PersonYear) {
    person_year.tfsa_end = accounts.tfsa.balance;
    person_year.rrsp_end = accounts.registered.rrsp;
    person_year.rrif_end = accounts.registered.rrif;
    person_year.nonreg_end = accounts.nonreg.balance();
    person_year.nonreg_acb_end = accounts.nonreg.acb;
    person_year.corporate_end = accounts.corporate.balance();
    person_year.tfsa_room_end = accounts.tfsa.room;
}

fn build_row(year: i32, plan: &HouseholdPlan, people: &[PersonYear]) -> YearResult {
    let mut row = YearResult {
        year,
        spending_need: plan.spending_need,
        spending_met: plan.spending_met,
        spending_gap: plan.spending_gap,
        plan_success: plan.plan_success,
        is_underfunded: !plan.plan_success,
        failure_reason: plan.failure_reason.clone(),
        pension_split_fraction: plan.pension_split_fraction,
        rrif_cap_exceeded: plan.people.iter().any(|p| p.rrif_cap_exceeded),
        ..Default::default()
    };
    row.set_people(people);
    row
}

/// Non-finite values or negative balances mean a bad intermediate figure
fn check_row(row: &YearResult, state: &SimulationState) -> Result<()> {
    if let Some((field, value)) = row.numeric_fields().into_iter().find(|(_, v)| !v.is_finite()) {
        return Err(SimulationError::Internal(format!(
            "{field} is not finite ({value})"
        )));
    }
    if !state.accounts.iter().all(PersonAccounts::all_non_negative) {
        return Err(SimulationError::Internal(
            "an account balance went negative".to_string(),
        ));
    }
    Ok(())
}
