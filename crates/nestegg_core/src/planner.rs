//! Withdrawal planner
//!
//! Chooses how much to draw from each account so that the household's
//! after-tax cash covers the year's spending target. The planner works on
//! January 1 snapshots ([`PersonInputs`]) and never mutates accounts; the
//! year driver applies the resulting [`Draw`]s.
//!
//! Per person the loop is:
//! 1. start from fixed inflows plus the mandatory registered floor
//! 2. pick the first source in strategy order that still has money
//! 3. solve for the gross amount whose after-tax value covers the remaining
//!    need, bisecting on the tax engine itself (never overshooting by more
//!    than a cent)
//! 4. re-run the tax engine and repeat, at most [`MAX_ITERATIONS`] times
//!
//! Couples then search for the pension split that minimises combined tax.

use crate::model::{DUST, DividendType};
use crate::strategy::{FillSource, StrategyPlan};
use crate::taxes::{IncomeBreakdown, PersonTax, TaxContext};

pub const MAX_ITERATIONS: usize = 20;

/// The solver stops once the remaining need is below this (or `gap_tolerance` if smaller)
const SOLVER_TOLERANCE: f64 = 0.5;

/// Step of the pension-split grid search
const SPLIT_STEP: f64 = 0.05;

/// Ceiling on the share of pension income that may be split
const SPLIT_LIMIT: f64 = 0.5;

/// Effective tax rates are clamped to this to keep gross-ups finite
const MAX_EFFECTIVE_RATE: f64 = 0.9;

/// Halvings allowed when solving for a gross withdrawal
const BISECTION_STEPS: usize = 60;

/// Width at which a gross-withdrawal search stops, in dollars
const GROSS_PRECISION: f64 = 0.01;

/// Tax increase still counted as "no tax" when sizing tax-free dividends
const TAX_FREE_SLACK: f64 = 0.01;

/// Gross amounts drawn from each source for one person
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Draw {
    pub registered: f64,
    pub tfsa: f64,
    pub nonreg: f64,
    pub corporate: f64,
}

impl Draw {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.registered + self.tfsa + self.nonreg + self.corporate
    }

    fn credit(&mut self, source: FillSource, amount: f64) {
        match source {
            FillSource::Tfsa => self.tfsa += amount,
            FillSource::NonRegistered => self.nonreg += amount,
            FillSource::Corporate | FillSource::CorporateTaxFree => self.corporate += amount,
            FillSource::Registered | FillSource::RegisteredToCap => self.registered += amount,
            // split by the solver before it gets here
            FillSource::Balanced => {}
        }
    }
}

/// January 1 balances available to the planner
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceBalances {
    pub rrif: f64,
    pub rrsp: f64,
    pub tfsa: f64,
    pub nonreg: f64,
    pub corporate: f64,
}

impl SourceBalances {
    #[must_use]
    pub fn registered(&self) -> f64 {
        self.rrif + self.rrsp
    }
}

/// Everything the planner needs to know about one person for the year
#[derive(Debug, Clone, PartialEq)]
pub struct PersonInputs {
    pub age: u32,
    pub disability: bool,
    /// Taxable inflows that do not depend on the plan
    pub fixed_income: IncomeBreakdown,
    /// Spendable inflows that do not depend on the plan (GIS included)
    pub fixed_cash: f64,
    /// Minimum registered withdrawal: RRIF minimum, early RRIF or hybrid top-up
    pub registered_floor: f64,
    /// Intended registered ceiling for `rrif-frontload`
    pub rrif_cap: Option<f64>,
    pub balances: SourceBalances,
    pub gain_fraction: f64,
    pub corporate_cda: f64,
    pub dividend_type: DividendType,
}

impl PersonInputs {
    /// Taxable income if `draw` is taken on top of the fixed inflows
    #[must_use]
    pub fn income_for(&self, draw: &Draw) -> IncomeBreakdown {
        let mut income = self.fixed_income;
        let from_rrif = draw.registered.min(self.balances.rrif);
        income.rrif += from_rrif;
        income.ordinary += draw.registered - from_rrif;
        income.capital_gains += draw.nonreg * self.gain_fraction;
        let capital_dividend = draw.corporate.min(self.corporate_cda);
        income.add_dividend(self.dividend_type, draw.corporate - capital_dividend);
        income
    }

    #[must_use]
    pub fn cash_for(&self, draw: &Draw) -> f64 {
        self.fixed_cash + draw.total()
    }
}

/// Shared, read-only planning parameters for the year
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub ctx: TaxContext<'a>,
    pub strategy: &'a StrategyPlan,
    /// After-tax spending target for the household
    pub target: f64,
    pub gap_tolerance: f64,
    pub pension_split_max: f64,
}

/// Planner output for one person
#[derive(Debug, Clone, PartialEq)]
pub struct PersonPlan {
    pub draw: Draw,
    /// Income after any pension split
    pub income: IncomeBreakdown,
    pub tax: PersonTax,
    pub cash_in: f64,
    pub rrif_cap_exceeded: bool,
}

impl PersonPlan {
    #[must_use]
    pub fn after_tax_cash(&self) -> f64 {
        self.cash_in - self.tax.net_tax
    }
}

/// Planner output for the household
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdPlan {
    pub people: Vec<PersonPlan>,
    pub pension_split_fraction: f64,
    pub spending_need: f64,
    pub spending_met: f64,
    pub spending_gap: f64,
    /// After-tax cash left over once spending is covered
    pub surplus: f64,
    pub plan_success: bool,
    pub failure_reason: Option<String>,
    pub iterations: usize,
}

impl HouseholdPlan {
    #[must_use]
    pub fn total_tax(&self) -> f64 {
        self.people.iter().map(|p| p.tax.net_tax).sum()
    }
}

// ============================================================================
// Single-person solver
// ============================================================================

struct PersonSolver<'p> {
    inputs: &'p PersonInputs,
    draw: Draw,
    tax: PersonTax,
    iterations: usize,
    /// Set once the tax-free corporate slice has been drawn in full
    tax_free_used: bool,
}

impl<'p> PersonSolver<'p> {
    fn new(inputs: &'p PersonInputs, ctx: &TaxContext<'_>) -> Self {
        let draw = Draw {
            registered: inputs
                .registered_floor
                .clamp(0.0, inputs.balances.registered()),
            ..Default::default()
        };
        let tax = ctx.person_tax(inputs.age, &inputs.income_for(&draw), inputs.disability);
        Self {
            inputs,
            draw,
            tax,
            iterations: 0,
            tax_free_used: false,
        }
    }

    fn after_tax(&self) -> f64 {
        self.inputs.cash_for(&self.draw) - self.tax.net_tax
    }

    fn tax_on(&self, ctx: &TaxContext<'_>, draw: &Draw) -> PersonTax {
        let income = self.inputs.income_for(draw);
        ctx.person_tax(self.inputs.age, &income, self.inputs.disability)
    }

    fn after_tax_on(&self, ctx: &TaxContext<'_>, draw: &Draw) -> f64 {
        self.inputs.cash_for(draw) - self.tax_on(ctx, draw).net_tax
    }

    fn retax(&mut self, ctx: &TaxContext<'_>) {
        self.tax = self.tax_on(ctx, &self.draw);
    }

    fn available(&self, source: FillSource) -> f64 {
        let b = &self.inputs.balances;
        let left = match source {
            FillSource::Tfsa => b.tfsa - self.draw.tfsa,
            FillSource::NonRegistered => b.nonreg - self.draw.nonreg,
            FillSource::Corporate | FillSource::CorporateTaxFree => {
                b.corporate - self.draw.corporate
            }
            FillSource::Registered => b.registered() - self.draw.registered,
            FillSource::RegisteredToCap => {
                let cap = self.inputs.rrif_cap.unwrap_or(f64::INFINITY);
                (cap - self.draw.registered).min(b.registered() - self.draw.registered)
            }
            FillSource::Balanced => {
                self.available(FillSource::Registered)
                    + self.available(FillSource::NonRegistered)
                    + self.available(FillSource::Corporate)
            }
        };
        left.max(0.0)
    }

    /// Most the solver may take from `source` in one step
    fn limit(&self, ctx: &TaxContext<'_>, source: FillSource) -> f64 {
        match source {
            FillSource::CorporateTaxFree if self.tax_free_used => 0.0,
            FillSource::CorporateTaxFree => self.tax_free_room(ctx),
            _ => self.available(source),
        }
    }

    /// Largest corporate draw that leaves net tax within [`TAX_FREE_SLACK`] of today's
    fn tax_free_room(&self, ctx: &TaxContext<'_>) -> f64 {
        let available = self.available(FillSource::Corporate);
        if available <= DUST {
            return 0.0;
        }
        let ceiling = self.tax.net_tax + TAX_FREE_SLACK;
        let fits = |g: f64| {
            self.tax_on(ctx, &self.with_added(FillSource::Corporate, g))
                .net_tax
                <= ceiling
        };
        if fits(available) {
            return available;
        }

        let (mut lo, mut hi) = (0.0, available);
        for _ in 0..BISECTION_STEPS {
            if hi - lo <= GROSS_PRECISION {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if fits(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Marginal rate on ordinary income, OAS recovery included while it is still biting
    fn marginal_rate(&self, ctx: &TaxContext<'_>) -> f64 {
        let oas = self.inputs.fixed_income.oas_received;
        let clawback = ctx
            .federal
            .oas_clawback
            .filter(|c| {
                oas > 0.0
                    && self.tax.taxable_income >= c.threshold
                    && self.tax.federal.oas_clawback < oas
            })
            .map(|c| c.rate)
            .unwrap_or(0.0);
        self.tax.marginal_rate + clawback
    }

    /// Share of the next gross dollar lost to tax for a source, from today's bracket
    fn effective_rate(&self, ctx: &TaxContext<'_>, source: FillSource, gross_estimate: f64) -> f64 {
        let m = self.marginal_rate(ctx);
        let rate = match source {
            FillSource::Tfsa => 0.0,
            FillSource::Registered | FillSource::RegisteredToCap => m,
            FillSource::NonRegistered => {
                m * ctx.capital_gains_inclusion() * self.inputs.gain_fraction
            }
            FillSource::Corporate | FillSource::CorporateTaxFree => {
                let kind = self.inputs.dividend_type;
                let gross_up = 1.0 + ctx.dividend_gross_up(kind);
                let dividend_rate = gross_up * (m - ctx.dividend_credit_rate(kind));
                let cda_left = (self.inputs.corporate_cda - self.draw.corporate).max(0.0);
                let taxable_share = if gross_estimate <= DUST {
                    1.0
                } else {
                    1.0 - (cda_left / gross_estimate).min(1.0)
                };
                taxable_share * dividend_rate.clamp(0.0, MAX_EFFECTIVE_RATE)
            }
            FillSource::Balanced => {
                let parts = self.balanced_parts();
                let total: f64 = parts.iter().map(|(_, a)| a).sum();
                if total <= DUST {
                    0.0
                } else {
                    parts
                        .iter()
                        .map(|(s, a)| a / total * self.effective_rate(ctx, *s, gross_estimate))
                        .sum()
                }
            }
        };
        rate.clamp(0.0, MAX_EFFECTIVE_RATE)
    }

    fn balanced_parts(&self) -> [(FillSource, f64); 3] {
        [
            FillSource::Registered,
            FillSource::NonRegistered,
            FillSource::Corporate,
        ]
        .map(|s| (s, self.available(s)))
    }

    /// The current draw with `amount` more taken from `source`
    fn with_added(&self, source: FillSource, amount: f64) -> Draw {
        let mut draw = self.draw;
        let amount = amount.min(self.available(source)).max(0.0);
        if source == FillSource::Balanced {
            let parts = self.balanced_parts();
            let total: f64 = parts.iter().map(|(_, a)| a).sum();
            if total > DUST {
                for (s, a) in parts {
                    draw.credit(s, (amount * a / total).min(a));
                }
            }
        } else {
            draw.credit(source, amount);
        }
        draw
    }

    /// Smallest gross from `source`, at most `limit`, that raises after-tax cash by `required`.
    ///
    /// The bracket-rate estimate only seeds the search; the answer is bisected
    /// on the real tax difference so a wrong rate cannot lock in an overdraw.
    fn solve_gross(
        &self,
        ctx: &TaxContext<'_>,
        source: FillSource,
        limit: f64,
        required: f64,
    ) -> f64 {
        let base = self.after_tax();
        let gain = |g: f64| self.after_tax_on(ctx, &self.with_added(source, g)) - base;
        if gain(limit) <= required {
            return limit;
        }

        let eff = self.effective_rate(ctx, source, required);
        let guess = (required / (1.0 - eff)).min(limit);
        let (mut lo, mut hi) = if gain(guess) >= required {
            (0.0, guess)
        } else {
            (guess, limit)
        };
        for _ in 0..BISECTION_STEPS {
            if hi - lo <= GROSS_PRECISION {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if gain(mid) >= required {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Draw enough to raise after-tax cash by `extra`. Returns the part left unmet.
    fn fill(&mut self, req: &PlanRequest<'_>, extra: f64, tolerance: f64) -> f64 {
        let target = self.after_tax() + extra;
        while self.iterations < MAX_ITERATIONS {
            let remaining = target - self.after_tax();
            if remaining <= tolerance {
                break;
            }
            let Some((source, limit)) = req
                .strategy
                .order
                .iter()
                .map(|s| (*s, self.limit(&req.ctx, *s)))
                .find(|(_, limit)| *limit > DUST)
            else {
                break;
            };

            let gross = self.solve_gross(&req.ctx, source, limit, remaining);
            if source == FillSource::CorporateTaxFree && gross >= limit - GROSS_PRECISION {
                self.tax_free_used = true;
            }
            self.draw = self.with_added(source, gross);
            self.retax(&req.ctx);
            self.iterations += 1;

            tracing::debug!(
                iteration = self.iterations,
                ?source,
                gross,
                limit,
                remaining = target - self.after_tax(),
                "planner step"
            );
        }
        (target - self.after_tax()).max(0.0)
    }

    fn has_funds(&self) -> bool {
        self.available(FillSource::Balanced) + self.available(FillSource::Tfsa) > DUST
    }

    fn cap_exceeded(&self) -> bool {
        match self.inputs.rrif_cap {
            Some(cap) => self.draw.registered > cap.max(self.inputs.registered_floor) + DUST,
            None => false,
        }
    }
}

// ============================================================================
// Pension income splitting
// ============================================================================

/// Result of the split search for a couple
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub fraction: f64,
    /// Index of the transferring spouse, when anything was split
    pub from: Option<usize>,
    pub incomes: [IncomeBreakdown; 2],
    pub taxes: [PersonTax; 2],
}

/// Move `fraction` of `from`'s eligible pension income to the other spouse
fn transfer(
    ctx: &TaxContext<'_>,
    incomes: &[IncomeBreakdown; 2],
    ages: [u32; 2],
    from: usize,
    fraction: f64,
) -> [IncomeBreakdown; 2] {
    let to = 1 - from;
    let mut out = *incomes;
    let moved = fraction * incomes[from].eligible_pension(ctx.federal, ages[from]);
    out[from].pension *= 1.0 - fraction;
    if ages[from] >= ctx.federal.credits.pension_credit_min_age {
        out[from].rrif *= 1.0 - fraction;
    }
    out[to].pension += moved;
    out
}

/// Grid search over split fractions from the higher-taxed spouse.
///
/// Ties keep the smaller fraction, so an unhelpful split is never applied.
#[must_use]
pub fn optimise_pension_split(
    ctx: &TaxContext<'_>,
    incomes: [IncomeBreakdown; 2],
    ages: [u32; 2],
    disability: [bool; 2],
    max_fraction: f64,
) -> SplitOutcome {
    let tax_pair = |inc: &[IncomeBreakdown; 2]| {
        [
            ctx.person_tax(ages[0], &inc[0], disability[0]),
            ctx.person_tax(ages[1], &inc[1], disability[1]),
        ]
    };

    let base_taxes = tax_pair(&incomes);
    let mut best = SplitOutcome {
        fraction: 0.0,
        from: None,
        incomes,
        taxes: base_taxes,
    };

    let from = if base_taxes[0].net_tax >= base_taxes[1].net_tax {
        0
    } else {
        1
    };
    let limit = max_fraction.clamp(0.0, SPLIT_LIMIT);
    if incomes[from].eligible_pension(ctx.federal, ages[from]) <= DUST || limit <= 0.0 {
        return best;
    }

    let mut best_total = base_taxes[0].net_tax + base_taxes[1].net_tax;
    let steps = (limit / SPLIT_STEP + 1e-9).floor() as usize;
    for k in 1..=steps {
        let fraction = k as f64 * SPLIT_STEP;
        let split = transfer(ctx, &incomes, ages, from, fraction);
        let taxes = tax_pair(&split);
        let total = taxes[0].net_tax + taxes[1].net_tax;
        if total < best_total - 1e-9 {
            best_total = total;
            best = SplitOutcome {
                fraction,
                from: Some(from),
                incomes: split,
                taxes,
            };
        }
    }
    best
}

// ============================================================================
// Household plan
// ============================================================================

/// Plan one year for a household of one or two people
#[must_use]
pub fn plan_year(req: &PlanRequest<'_>, people: &[PersonInputs]) -> HouseholdPlan {
    let tolerance = req.gap_tolerance.min(SOLVER_TOLERANCE);
    let mut solvers: Vec<PersonSolver<'_>> = people
        .iter()
        .map(|p| PersonSolver::new(p, &req.ctx))
        .collect();

    let household_after_tax =
        |solvers: &[PersonSolver<'_>]| solvers.iter().map(PersonSolver::after_tax).sum::<f64>();

    let need = req.target - household_after_tax(&solvers);
    if need > tolerance && !solvers.is_empty() {
        // Equal shares first, then whoever still has money covers the rest
        let share = need / solvers.len() as f64;
        let per_person_tolerance = tolerance / solvers.len() as f64;
        for solver in &mut solvers {
            solver.fill(req, share, per_person_tolerance);
        }
        for i in 0..solvers.len() {
            let gap = req.target - household_after_tax(&solvers);
            if gap <= tolerance {
                break;
            }
            solvers[i].fill(req, gap, tolerance);
        }
    }

    let iterations = solvers.iter().map(|s| s.iterations).sum();
    let has_funds = solvers.iter().any(PersonSolver::has_funds);

    let mut plans: Vec<PersonPlan> = solvers
        .iter()
        .map(|s| PersonPlan {
            draw: s.draw,
            income: s.inputs.income_for(&s.draw),
            tax: s.tax,
            cash_in: s.inputs.cash_for(&s.draw),
            rrif_cap_exceeded: s.cap_exceeded(),
        })
        .collect();

    let mut pension_split_fraction = 0.0;
    if let [a, b] = plans.as_mut_slice()
        && req.pension_split_max > 0.0
    {
        let outcome = optimise_pension_split(
            &req.ctx,
            [a.income, b.income],
            [people[0].age, people[1].age],
            [people[0].disability, people[1].disability],
            req.pension_split_max,
        );
        pension_split_fraction = outcome.fraction;
        a.income = outcome.incomes[0];
        b.income = outcome.incomes[1];
        a.tax = outcome.taxes[0];
        b.tax = outcome.taxes[1];
    }

    let net: f64 = plans.iter().map(PersonPlan::after_tax_cash).sum();
    let spending_gap = (req.target - net).max(0.0);
    let plan_success = spending_gap <= req.gap_tolerance;
    let failure_reason = (!plan_success).then(|| {
        if has_funds {
            format!(
                "{}: shortfall of {spending_gap:.2} after {MAX_ITERATIONS} planner iterations",
                req.strategy.strategy
            )
        } else {
            format!(
                "{}: accounts exhausted with a shortfall of {spending_gap:.2}",
                req.strategy.strategy
            )
        }
    });

    HouseholdPlan {
        people: plans,
        pension_split_fraction,
        spending_need: req.target,
        spending_met: net.clamp(0.0, req.target.max(0.0)),
        spending_gap,
        surplus: (net - req.target).max(0.0),
        plan_success,
        failure_reason,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Province, Strategy, TaxConfig};

    fn inputs(balances: SourceBalances) -> PersonInputs {
        PersonInputs {
            age: 70,
            disability: false,
            fixed_income: IncomeBreakdown::default(),
            fixed_cash: 0.0,
            registered_floor: 0.0,
            rrif_cap: None,
            balances,
            gain_fraction: 0.0,
            corporate_cda: 0.0,
            dividend_type: DividendType::Eligible,
        }
    }

    #[test]
    fn test_tfsa_only_needs_no_gross_up() {
        let config = TaxConfig::canada_2025();
        let plan = Strategy::TfsaFirst.plan();
        let req = PlanRequest {
            ctx: TaxContext::new(&config, Province::ON).unwrap(),
            strategy: &plan,
            target: 30_000.0,
            gap_tolerance: 100.0,
            pension_split_max: 0.5,
        };
        let person = inputs(SourceBalances {
            tfsa: 100_000.0,
            ..Default::default()
        });
        let result = plan_year(&req, &[person]);
        assert!(result.plan_success);
        assert!((result.people[0].draw.tfsa - 30_000.0).abs() < 1e-6);
        assert_eq!(result.total_tax(), 0.0);
    }

    #[test]
    fn test_registered_gross_up_converges() {
        let config = TaxConfig::canada_2025();
        let plan = Strategy::MinimizeIncome.plan();
        let req = PlanRequest {
            ctx: TaxContext::new(&config, Province::AB).unwrap(),
            strategy: &plan,
            target: 60_000.0,
            gap_tolerance: 100.0,
            pension_split_max: 0.5,
        };
        let mut person = inputs(SourceBalances {
            rrif: 1_000_000.0,
            ..Default::default()
        });
        person.balances.rrsp = 0.0;
        let result = plan_year(&req, &[person]);
        let p = &result.people[0];
        assert!(result.spending_gap < 1.0, "gap {}", result.spending_gap);
        assert!(p.draw.registered > 60_000.0, "registered draw must be grossed up");
        assert!((p.after_tax_cash() - 60_000.0).abs() < 25.0);
    }

    #[test]
    fn test_registered_draw_does_not_overshoot_small_target() {
        let config = TaxConfig::canada_2025();
        let plan = Strategy::MinimizeIncome.plan();
        let req = PlanRequest {
            ctx: TaxContext::new(&config, Province::AB).unwrap(),
            strategy: &plan,
            target: 20_000.0,
            gap_tolerance: 100.0,
            pension_split_max: 0.5,
        };
        let person = inputs(SourceBalances {
            rrif: 1_000_000.0,
            ..Default::default()
        });
        let result = plan_year(&req, &[person]);
        let p = &result.people[0];

        // Credits shelter most of the first $20k, so a bracket-rate gross-up overdraws
        assert!(p.draw.registered < 21_000.0, "overdrew {}", p.draw.registered);
        assert!(result.surplus < 1.0, "surplus {}", result.surplus);
        assert!((p.after_tax_cash() - 20_000.0).abs() < 1.0);
    }

    #[test]
    fn test_minimize_income_stops_dividends_where_tax_starts() {
        let config = TaxConfig::canada_2025();
        let plan = Strategy::MinimizeIncome.plan();
        let ctx = TaxContext::new(&config, Province::AB).unwrap();
        let req = PlanRequest {
            ctx,
            strategy: &plan,
            target: 150_000.0,
            gap_tolerance: 100.0,
            pension_split_max: 0.5,
        };
        let mut person = inputs(SourceBalances {
            nonreg: 500_000.0,
            corporate: 1_000_000.0,
            ..Default::default()
        });
        person.age = 65;
        person.gain_fraction = 0.1;
        let result = plan_year(&req, &[person.clone()]);
        let p = &result.people[0];

        assert!(result.plan_success);
        assert!(p.draw.corporate > 10_000.0, "corporate {}", p.draw.corporate);
        assert!(p.draw.nonreg > 0.0, "the rest comes from non-registered");

        let dividends_only = Draw {
            corporate: p.draw.corporate,
            ..Default::default()
        };
        let tax = ctx.person_tax(65, &person.income_for(&dividends_only), false);
        assert!(tax.net_tax < 0.05, "dividend slice was taxed: {}", tax.net_tax);
    }

    #[test]
    fn test_empty_accounts_fail_with_reason() {
        let config = TaxConfig::canada_2025();
        let plan = Strategy::Balanced.plan();
        let req = PlanRequest {
            ctx: TaxContext::new(&config, Province::ON).unwrap(),
            strategy: &plan,
            target: 10_000.0,
            gap_tolerance: 100.0,
            pension_split_max: 0.5,
        };
        let result = plan_year(&req, &[inputs(SourceBalances::default())]);
        assert!(!result.plan_success);
        assert_eq!(result.spending_gap, 10_000.0);
        assert!(result.failure_reason.unwrap().contains("exhausted"));
    }
}
