//! Simulation output records
//!
//! One flat [`YearResult`] per simulated year plus a [`SimulationSummary`].
//! Field names are part of the host contract and use `_p1` / `_p2`
//! suffixes; single-person households report zeros for `_p2`.

use serde::{Deserialize, Serialize};

use super::household::Strategy;

/// Spending gap (in dollars) under which a year counts as funded in the summary
pub const FUNDED_GAP_EPSILON: f64 = 1.0;

/// Per-person figures for one year, flattened into a [`YearResult`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonYear {
    pub age: u32,
    pub employer_pension: f64,
    pub other_income: f64,
    pub cpp: f64,
    pub oas: f64,
    pub gis: f64,
    pub nonreg_distributions: f64,
    pub rrif_minimum: f64,
    pub rrif_withdrawal: f64,
    pub rrsp_withdrawal: f64,
    pub tfsa_withdrawal: f64,
    pub nonreg_withdrawal: f64,
    pub corporate_withdrawal: f64,
    pub realized_capital_gains: f64,
    pub taxable_income: f64,
    pub gross_tax: f64,
    pub total_tax: f64,
    pub oas_clawback: f64,
    pub marginal_rate: f64,
    pub gis_eligible_income: f64,
    pub tfsa_contribution: f64,
    pub nonreg_contribution: f64,
    pub tfsa_end: f64,
    pub rrsp_end: f64,
    pub rrif_end: f64,
    pub nonreg_end: f64,
    pub nonreg_acb_end: f64,
    pub corporate_end: f64,
    pub tfsa_room_end: f64,
}

impl PersonYear {
    #[must_use]
    pub fn withdrawals(&self) -> f64 {
        self.rrif_withdrawal
            + self.rrsp_withdrawal
            + self.tfsa_withdrawal
            + self.nonreg_withdrawal
            + self.corporate_withdrawal
    }

    #[must_use]
    pub fn net_worth_end(&self) -> f64 {
        self.tfsa_end + self.rrsp_end + self.rrif_end + self.nonreg_end + self.corporate_end
    }
}

/// One row of the projection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearResult {
    pub year: i32,
    pub age_p1: u32,
    pub age_p2: Option<u32>,

    pub spending_need: f64,
    pub spending_met: f64,
    pub spending_gap: f64,
    pub plan_success: bool,
    pub is_underfunded: bool,
    pub failure_reason: Option<String>,

    pub employer_pension_p1: f64,
    pub employer_pension_p2: f64,
    pub other_income_p1: f64,
    pub other_income_p2: f64,
    pub cpp_p1: f64,
    pub cpp_p2: f64,
    pub oas_p1: f64,
    pub oas_p2: f64,
    pub gis_p1: f64,
    pub gis_p2: f64,
    pub nonreg_distributions_p1: f64,
    pub nonreg_distributions_p2: f64,

    pub rrif_minimum_p1: f64,
    pub rrif_minimum_p2: f64,
    pub rrif_withdrawal_p1: f64,
    pub rrif_withdrawal_p2: f64,
    pub rrsp_withdrawal_p1: f64,
    pub rrsp_withdrawal_p2: f64,
    pub tfsa_withdrawal_p1: f64,
    pub tfsa_withdrawal_p2: f64,
    pub nonreg_withdrawal_p1: f64,
    pub nonreg_withdrawal_p2: f64,
    pub corporate_withdrawal_p1: f64,
    pub corporate_withdrawal_p2: f64,
    pub realized_capital_gains_p1: f64,
    pub realized_capital_gains_p2: f64,

    pub taxable_income_p1: f64,
    pub taxable_income_p2: f64,
    pub gross_tax_p1: f64,
    pub gross_tax_p2: f64,
    pub total_tax_p1: f64,
    pub total_tax_p2: f64,
    pub total_tax: f64,
    pub oas_clawback_p1: f64,
    pub oas_clawback_p2: f64,
    pub marginal_rate_p1: f64,
    pub marginal_rate_p2: f64,
    pub gis_eligible_income_p1: f64,
    pub gis_eligible_income_p2: f64,
    /// Share of the transferring spouse's eligible pension income moved to the other
    pub pension_split_fraction: f64,
    /// `rrif-frontload` had to draw past its intended cap
    pub rrif_cap_exceeded: bool,

    pub surplus_reinvested_tfsa: f64,
    pub surplus_reinvested_nonreg: f64,

    pub tfsa_end_p1: f64,
    pub tfsa_end_p2: f64,
    pub rrsp_end_p1: f64,
    pub rrsp_end_p2: f64,
    pub rrif_end_p1: f64,
    pub rrif_end_p2: f64,
    pub nonreg_end_p1: f64,
    pub nonreg_end_p2: f64,
    pub nonreg_acb_end_p1: f64,
    pub nonreg_acb_end_p2: f64,
    pub corporate_end_p1: f64,
    pub corporate_end_p2: f64,
    pub tfsa_room_end_p1: f64,
    pub tfsa_room_end_p2: f64,
    pub net_worth_end: f64,
}

impl YearResult {
    /// Spread per-person figures over the `_p1` / `_p2` columns
    pub fn set_people(&mut self, people: &[PersonYear]) {
        let empty = PersonYear::default();
        let p1 = people.first().unwrap_or(&empty);
        let p2 = people.get(1).unwrap_or(&empty);

        self.age_p1 = p1.age;
        self.age_p2 = people.get(1).map(|p| p.age);

        self.employer_pension_p1 = p1.employer_pension;
        self.employer_pension_p2 = p2.employer_pension;
        self.other_income_p1 = p1.other_income;
        self.other_income_p2 = p2.other_income;
        self.cpp_p1 = p1.cpp;
        self.cpp_p2 = p2.cpp;
        self.oas_p1 = p1.oas;
        self.oas_p2 = p2.oas;
        self.gis_p1 = p1.gis;
        self.gis_p2 = p2.gis;
        self.nonreg_distributions_p1 = p1.nonreg_distributions;
        self.nonreg_distributions_p2 = p2.nonreg_distributions;

        self.rrif_minimum_p1 = p1.rrif_minimum;
        self.rrif_minimum_p2 = p2.rrif_minimum;
        self.rrif_withdrawal_p1 = p1.rrif_withdrawal;
        self.rrif_withdrawal_p2 = p2.rrif_withdrawal;
        self.rrsp_withdrawal_p1 = p1.rrsp_withdrawal;
        self.rrsp_withdrawal_p2 = p2.rrsp_withdrawal;
        self.tfsa_withdrawal_p1 = p1.tfsa_withdrawal;
        self.tfsa_withdrawal_p2 = p2.tfsa_withdrawal;
        self.nonreg_withdrawal_p1 = p1.nonreg_withdrawal;
        self.nonreg_withdrawal_p2 = p2.nonreg_withdrawal;
        self.corporate_withdrawal_p1 = p1.corporate_withdrawal;
        self.corporate_withdrawal_p2 = p2.corporate_withdrawal;
        self.realized_capital_gains_p1 = p1.realized_capital_gains;
        self.realized_capital_gains_p2 = p2.realized_capital_gains;

        self.taxable_income_p1 = p1.taxable_income;
        self.taxable_income_p2 = p2.taxable_income;
        self.gross_tax_p1 = p1.gross_tax;
        self.gross_tax_p2 = p2.gross_tax;
        self.total_tax_p1 = p1.total_tax;
        self.total_tax_p2 = p2.total_tax;
        self.total_tax = p1.total_tax + p2.total_tax;
        self.oas_clawback_p1 = p1.oas_clawback;
        self.oas_clawback_p2 = p2.oas_clawback;
        self.marginal_rate_p1 = p1.marginal_rate;
        self.marginal_rate_p2 = p2.marginal_rate;
        self.gis_eligible_income_p1 = p1.gis_eligible_income;
        self.gis_eligible_income_p2 = p2.gis_eligible_income;

        self.surplus_reinvested_tfsa = p1.tfsa_contribution + p2.tfsa_contribution;
        self.surplus_reinvested_nonreg = p1.nonreg_contribution + p2.nonreg_contribution;

        self.tfsa_end_p1 = p1.tfsa_end;
        self.tfsa_end_p2 = p2.tfsa_end;
        self.rrsp_end_p1 = p1.rrsp_end;
        self.rrsp_end_p2 = p2.rrsp_end;
        self.rrif_end_p1 = p1.rrif_end;
        self.rrif_end_p2 = p2.rrif_end;
        self.nonreg_end_p1 = p1.nonreg_end;
        self.nonreg_end_p2 = p2.nonreg_end;
        self.nonreg_acb_end_p1 = p1.nonreg_acb_end;
        self.nonreg_acb_end_p2 = p2.nonreg_acb_end;
        self.corporate_end_p1 = p1.corporate_end;
        self.corporate_end_p2 = p2.corporate_end;
        self.tfsa_room_end_p1 = p1.tfsa_room_end;
        self.tfsa_room_end_p2 = p2.tfsa_room_end;
        self.net_worth_end = p1.net_worth_end() + p2.net_worth_end();
    }

    #[must_use]
    pub fn total_withdrawals(&self) -> f64 {
        self.rrif_withdrawal_p1
            + self.rrif_withdrawal_p2
            + self.rrsp_withdrawal_p1
            + self.rrsp_withdrawal_p2
            + self.tfsa_withdrawal_p1
            + self.tfsa_withdrawal_p2
            + self.nonreg_withdrawal_p1
            + self.nonreg_withdrawal_p2
            + self.corporate_withdrawal_p1
            + self.corporate_withdrawal_p2
    }

    /// Public pension and GIS received (before clawback)
    #[must_use]
    pub fn total_benefits(&self) -> f64 {
        self.cpp_p1 + self.cpp_p2 + self.oas_p1 + self.oas_p2 + self.gis_p1 + self.gis_p2
    }

    /// Every numeric field of the row, for finiteness checks
    #[must_use]
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("spending_need", self.spending_need),
            ("spending_met", self.spending_met),
            ("spending_gap", self.spending_gap),
            ("cpp_p1", self.cpp_p1),
            ("cpp_p2", self.cpp_p2),
            ("oas_p1", self.oas_p1),
            ("oas_p2", self.oas_p2),
            ("gis_p1", self.gis_p1),
            ("gis_p2", self.gis_p2),
            ("total_tax_p1", self.total_tax_p1),
            ("total_tax_p2", self.total_tax_p2),
            ("marginal_rate_p1", self.marginal_rate_p1),
            ("marginal_rate_p2", self.marginal_rate_p2),
            ("tfsa_end_p1", self.tfsa_end_p1),
            ("tfsa_end_p2", self.tfsa_end_p2),
            ("rrsp_end_p1", self.rrsp_end_p1),
            ("rrsp_end_p2", self.rrsp_end_p2),
            ("rrif_end_p1", self.rrif_end_p1),
            ("rrif_end_p2", self.rrif_end_p2),
            ("nonreg_end_p1", self.nonreg_end_p1),
            ("nonreg_end_p2", self.nonreg_end_p2),
            ("nonreg_acb_end_p1", self.nonreg_acb_end_p1),
            ("nonreg_acb_end_p2", self.nonreg_acb_end_p2),
            ("corporate_end_p1", self.corporate_end_p1),
            ("corporate_end_p2", self.corporate_end_p2),
            ("net_worth_end", self.net_worth_end),
        ]
    }
}

/// Aggregates over every simulated year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub years_simulated: usize,
    /// Years whose spending gap is under one dollar
    pub years_funded: usize,
    pub success_rate: f64,
    pub total_tax: f64,
    pub total_spending_met: f64,
    pub total_withdrawals: f64,
    pub total_benefits: f64,
    pub median_net_worth: f64,
    pub final_net_worth: f64,
    pub first_failure_year: Option<i32>,
}

impl SimulationSummary {
    #[must_use]
    pub fn from_years(years: &[YearResult]) -> Self {
        let years_simulated = years.len();
        let years_funded = years
            .iter()
            .filter(|y| y.spending_gap < FUNDED_GAP_EPSILON)
            .count();

        let mut net_worths: Vec<f64> = years.iter().map(|y| y.net_worth_end).collect();
        net_worths.sort_by(f64::total_cmp);

        Self {
            years_simulated,
            years_funded,
            success_rate: if years_simulated == 0 {
                0.0
            } else {
                years_funded as f64 / years_simulated as f64
            },
            total_tax: years.iter().map(|y| y.total_tax).sum(),
            total_spending_met: years.iter().map(|y| y.spending_met).sum(),
            total_withdrawals: years.iter().map(YearResult::total_withdrawals).sum(),
            total_benefits: years.iter().map(YearResult::total_benefits).sum(),
            median_net_worth: median_sorted(&net_worths),
            final_net_worth: years.last().map(|y| y.net_worth_end).unwrap_or(0.0),
            first_failure_year: years.iter().find(|y| !y.plan_success).map(|y| y.year),
        }
    }
}

fn median_sorted(values: &[f64]) -> f64 {
    let n = values.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => values[n / 2],
        _ => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

/// Complete output of one deterministic run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy: Strategy,
    pub years: Vec<YearResult>,
    pub summary: SimulationSummary,
}

impl SimulationResult {
    #[must_use]
    pub fn year(&self, year: i32) -> Option<&YearResult> {
        self.years.iter().find(|y| y.year == year)
    }

    #[must_use]
    pub fn first_year(&self) -> Option<&YearResult> {
        self.years.first()
    }
}
