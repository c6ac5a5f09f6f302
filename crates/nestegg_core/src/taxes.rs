//! Personal income tax for one person in one year
//!
//! Pure functions over an [`IncomeBreakdown`] and a jurisdiction's
//! parameters. Federal and provincial tax are computed separately with the
//! same routine and combined by [`TaxContext::person_tax`].

use crate::error::ConfigError;
use crate::model::{DividendType, JurisdictionParams, Province, TaxBracket, TaxConfig};

/// Income of one person decomposed by tax treatment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncomeBreakdown {
    /// Fully taxable: CPP/QPP, RRSP withdrawals, interest, other streams
    pub ordinary: f64,
    /// Eligible pension income at any age (employer pensions, split-in amounts)
    pub pension: f64,
    /// RRIF withdrawals: eligible pension income from `credits.pension_credit_min_age`
    pub rrif: f64,
    /// Actual (not grossed-up) eligible dividends
    pub eligible_dividends: f64,
    /// Actual (not grossed-up) non-eligible dividends
    pub non_eligible_dividends: f64,
    /// Realised or distributed gains before inclusion
    pub capital_gains: f64,
    pub oas_received: f64,
}

impl IncomeBreakdown {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.ordinary,
            self.pension,
            self.rrif,
            self.eligible_dividends,
            self.non_eligible_dividends,
            self.capital_gains,
            self.oas_received,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    pub fn add_dividend(&mut self, kind: DividendType, amount: f64) {
        match kind {
            DividendType::Eligible => self.eligible_dividends += amount,
            DividendType::NonEligible => self.non_eligible_dividends += amount,
        }
    }

    /// Pension income that qualifies for the credit and for splitting at `age`
    #[must_use]
    pub fn eligible_pension(&self, params: &JurisdictionParams, age: u32) -> f64 {
        if age >= params.credits.pension_credit_min_age {
            self.pension + self.rrif
        } else {
            self.pension
        }
    }
}

/// Every intermediate figure of one jurisdiction's calculation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaxResult {
    pub taxable_income: f64,
    pub gross_tax: f64,
    pub total_credits: f64,
    pub tax_after_credits: f64,
    pub oas_clawback: f64,
    pub net_tax: f64,
    pub marginal_rate: f64,
}

/// Tax on `income` where each entry's rate applies from its own threshold
/// up to the next entry's threshold; the last entry is open-ended.
#[must_use]
pub fn apply_brackets(income: f64, brackets: &[TaxBracket]) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }

    let mut tax = 0.0;
    for (i, bracket) in brackets.iter().enumerate() {
        if income <= bracket.threshold {
            break;
        }
        let upper = brackets
            .get(i + 1)
            .map(|b| b.threshold)
            .unwrap_or(f64::INFINITY);
        tax += (income.min(upper) - bracket.threshold) * bracket.rate;
    }
    tax
}

/// Rate of the bracket containing `income`
#[must_use]
pub fn marginal_rate_at(income: f64, brackets: &[TaxBracket]) -> f64 {
    brackets
        .iter()
        .take_while(|b| income >= b.threshold)
        .last()
        .or(brackets.first())
        .map(|b| b.rate)
        .unwrap_or(0.0)
}

/// Taxable income after dividend gross-up and capital-gains inclusion
#[must_use]
pub fn taxable_income(params: &JurisdictionParams, income: &IncomeBreakdown) -> f64 {
    income.ordinary
        + income.pension
        + income.rrif
        + income.eligible_dividends * (1.0 + params.dividend.gross_up_elig)
        + income.non_eligible_dividends * (1.0 + params.dividend.gross_up_nonelig)
        + income.capital_gains * params.capital_gains_inclusion
        + income.oas_received
}

/// Tax for one jurisdiction
#[must_use]
pub fn progressive_tax(
    params: &JurisdictionParams,
    age: u32,
    income: &IncomeBreakdown,
    disability: bool,
) -> TaxResult {
    let taxable = taxable_income(params, income);
    let gross_tax = apply_brackets(taxable, &params.brackets);

    let credits = &params.credits;
    let age_amount = if age >= credits.age_credit_min_age {
        (credits.age_amount - credits.age_phaseout_rate * (taxable - credits.age_threshold).max(0.0))
            .max(0.0)
    } else {
        0.0
    };
    let pension_amount = income
        .eligible_pension(params, age)
        .min(credits.pension_amount)
        .max(0.0);
    let disability_amount = if disability { credits.disability } else { 0.0 };
    let credit_base = credits.basic_personal + age_amount + pension_amount + disability_amount;

    let dividend_credits = params.dividend.cred_elig
        * income.eligible_dividends
        * (1.0 + params.dividend.gross_up_elig)
        + params.dividend.cred_nonelig
            * income.non_eligible_dividends
            * (1.0 + params.dividend.gross_up_nonelig);

    let total_credits = params.lowest_rate() * credit_base + dividend_credits;
    let tax_after_credits = (gross_tax - total_credits).max(0.0);

    let oas_clawback = params
        .oas_clawback
        .map(|c| {
            (c.rate * (taxable - c.threshold).max(0.0))
                .min(income.oas_received)
                .max(0.0)
        })
        .unwrap_or(0.0);

    TaxResult {
        taxable_income: taxable,
        gross_tax,
        total_credits,
        tax_after_credits,
        oas_clawback,
        net_tax: tax_after_credits + oas_clawback,
        marginal_rate: marginal_rate_at(taxable, &params.brackets),
    }
}

/// Combined federal and provincial tax for one person
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PersonTax {
    pub federal: TaxResult,
    pub provincial: TaxResult,
    pub taxable_income: f64,
    pub gross_tax: f64,
    pub net_tax: f64,
    pub marginal_rate: f64,
}

/// Federal and provincial parameters resolved once for a household
#[derive(Debug, Clone, Copy)]
pub struct TaxContext<'a> {
    pub federal: &'a JurisdictionParams,
    pub provincial: &'a JurisdictionParams,
}

impl<'a> TaxContext<'a> {
    pub fn new(config: &'a TaxConfig, province: Province) -> Result<Self, ConfigError> {
        Ok(Self {
            federal: &config.federal,
            provincial: config.province(province)?,
        })
    }

    #[must_use]
    pub fn person_tax(&self, age: u32, income: &IncomeBreakdown, disability: bool) -> PersonTax {
        let federal = progressive_tax(self.federal, age, income, disability);
        let provincial = progressive_tax(self.provincial, age, income, disability);

        // Abatement reduces basic federal tax, never the OAS recovery
        let abatement = self.provincial.federal_abatement;
        let federal_after_abatement = federal.tax_after_credits * (1.0 - abatement);
        let net_tax = federal_after_abatement + federal.oas_clawback + provincial.net_tax;
        let marginal_rate =
            federal.marginal_rate * (1.0 - abatement) + provincial.marginal_rate;

        PersonTax {
            federal,
            provincial,
            taxable_income: federal.taxable_income,
            gross_tax: federal.gross_tax + provincial.gross_tax,
            net_tax,
            marginal_rate,
        }
    }

    /// Combined dividend credit per dollar of grossed-up dividend
    #[must_use]
    pub fn dividend_credit_rate(&self, kind: DividendType) -> f64 {
        match kind {
            DividendType::Eligible => {
                self.federal.dividend.cred_elig + self.provincial.dividend.cred_elig
            }
            DividendType::NonEligible => {
                self.federal.dividend.cred_nonelig + self.provincial.dividend.cred_nonelig
            }
        }
    }

    #[must_use]
    pub fn dividend_gross_up(&self, kind: DividendType) -> f64 {
        match kind {
            DividendType::Eligible => self.federal.dividend.gross_up_elig,
            DividendType::NonEligible => self.federal.dividend.gross_up_nonelig,
        }
    }

    #[must_use]
    pub fn capital_gains_inclusion(&self) -> f64 {
        self.federal.capital_gains_inclusion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_use_own_threshold_as_lower_edge() {
        let brackets = TaxConfig::canada_2025().federal.brackets;
        let tax = apply_brackets(135_977.45, &brackets);
        assert!((tax - 26_136.14).abs() < 0.10, "got {tax}");
    }

    #[test]
    fn test_marginal_rate_lookup() {
        let brackets = TaxConfig::canada_2025().federal.brackets;
        assert_eq!(marginal_rate_at(0.0, &brackets), 0.15);
        assert_eq!(marginal_rate_at(55_866.99, &brackets), 0.15);
        assert_eq!(marginal_rate_at(55_867.0, &brackets), 0.205);
        assert_eq!(marginal_rate_at(1_000_000.0, &brackets), 0.33);
        assert_eq!(marginal_rate_at(10.0, &[]), 0.0);
    }

    #[test]
    fn test_zero_income_pays_nothing() {
        let config = TaxConfig::canada_2025();
        let ctx = TaxContext::new(&config, Province::ON).unwrap();
        let tax = ctx.person_tax(70, &IncomeBreakdown::default(), false);
        assert_eq!(tax.net_tax, 0.0);
        assert_eq!(tax.gross_tax, 0.0);
    }
}
