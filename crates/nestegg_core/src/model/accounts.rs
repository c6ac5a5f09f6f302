//! Per-person account balances and their annual mechanics
//!
//! Withdrawals are applied before growth. Non-registered and corporate
//! accounts are split into cash/GIC/invest sub-buckets that each produce
//! income of a designated kind.

use serde::{Deserialize, Serialize};

use super::household::{BucketSplit, DividendType, InvestmentYields, Person};
use super::tax_config::CorporateTaxParams;

/// Amounts below this are treated as empty
pub const DUST: f64 = 0.005;

/// Income paid out by a non-registered or corporate holding during a year
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    pub interest: f64,
    pub eligible_dividends: f64,
    pub non_eligible_dividends: f64,
    pub capital_gains: f64,
    pub return_of_capital: f64,
}

impl Distributions {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.interest
            + self.eligible_dividends
            + self.non_eligible_dividends
            + self.capital_gains
            + self.return_of_capital
    }
}

/// Cash / GIC / invest sub-buckets of one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Buckets {
    pub cash: f64,
    pub gic: f64,
    pub invest: f64,
}

impl Buckets {
    /// Split a balance; without a split everything sits in the invest bucket
    #[must_use]
    pub fn from_split(total: f64, split: Option<BucketSplit>) -> Self {
        let split = split.unwrap_or_default();
        Self {
            cash: total * split.cash,
            gic: total * split.gic,
            invest: total * split.invest,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.cash + self.gic + self.invest
    }

    /// Income each bucket generates for the year
    #[must_use]
    pub fn distributions(&self, yields: &InvestmentYields) -> Distributions {
        Distributions {
            interest: self.cash * yields.cash_interest + self.gic * yields.gic_interest,
            eligible_dividends: self.invest * yields.eligible_dividend,
            non_eligible_dividends: self.invest * yields.non_eligible_dividend,
            capital_gains: self.invest * yields.capital_gains_distribution,
            return_of_capital: self.invest * yields.return_of_capital,
        }
    }

    /// Draw cash first, then GIC, then invest. Returns the amount drawn.
    pub fn withdraw(&mut self, amount: f64) -> f64 {
        let mut remaining = amount.max(0.0);
        for bucket in [&mut self.cash, &mut self.gic, &mut self.invest] {
            let take = remaining.min(*bucket);
            *bucket -= take;
            remaining -= take;
        }
        for bucket in [&mut self.cash, &mut self.gic, &mut self.invest] {
            if *bucket < DUST {
                *bucket = 0.0;
            }
        }
        amount.max(0.0) - remaining
    }

    /// Price appreciation stays inside the invest bucket
    pub fn grow(&mut self, yields: &InvestmentYields) {
        self.invest = (self.invest * (1.0 + yields.price_growth)).max(0.0);
    }
}

/// Result of selling non-registered units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Disposition {
    pub proceeds: f64,
    pub acb_released: f64,
    pub capital_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonRegisteredAccount {
    pub buckets: Buckets,
    pub acb: f64,
    pub yields: InvestmentYields,
}

impl NonRegisteredAccount {
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.buckets.total()
    }

    /// Share of each dollar withdrawn that is a realised gain
    #[must_use]
    pub fn gain_fraction(&self) -> f64 {
        let balance = self.balance();
        if balance <= DUST {
            return 0.0;
        }
        ((balance - self.acb) / balance).clamp(0.0, 1.0)
    }

    /// Sell `amount`; ACB is released pro-rata to the share of the account sold
    pub fn withdraw(&mut self, amount: f64) -> Disposition {
        let balance = self.balance();
        if balance <= DUST || amount <= 0.0 {
            return Disposition::default();
        }
        let proceeds = self.buckets.withdraw(amount.min(balance));
        let acb_released = self.acb * (proceeds / balance).min(1.0);
        self.acb = (self.acb - acb_released).max(0.0);
        Disposition {
            proceeds,
            acb_released,
            capital_gain: (proceeds - acb_released).max(0.0),
        }
    }

    /// Reinvested distributions buy new units; RoC always reduces ACB
    pub fn settle_distributions(&mut self, distributions: &Distributions, reinvest: bool) {
        if reinvest {
            let amount = distributions.total();
            self.buckets.invest += amount;
            self.acb += amount;
        }
        self.acb = (self.acb - distributions.return_of_capital).max(0.0);
    }

    pub fn deposit(&mut self, amount: f64) {
        if amount > 0.0 {
            self.buckets.invest += amount;
            self.acb += amount;
        }
    }

    pub fn grow(&mut self) {
        self.buckets.grow(&self.yields);
    }
}

/// A corporate payout split into its tax-free and taxable parts
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorporatePayout {
    pub paid: f64,
    pub capital_dividend: f64,
    pub taxable_dividend: f64,
    pub refund: f64,
}

/// Income earned and taxed inside the corporation for one year
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorporateIncome {
    pub distributions: Distributions,
    pub passive_tax: f64,
    pub refundable_added: f64,
    pub cda_added: f64,
}

/// Holding company owned by one person for attribution purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateAccount {
    pub buckets: Buckets,
    pub yields: InvestmentYields,
    pub dividend_type: DividendType,
    /// Capital dividend account: paid out tax-free
    pub cda: f64,
    /// Refundable tax pool released as taxable dividends are paid
    pub rdtoh: f64,
}

impl CorporateAccount {
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.buckets.total()
    }

    /// How a payout of `amount` would split between CDA and taxable dividend
    #[must_use]
    pub fn preview(&self, amount: f64) -> (f64, f64) {
        let paid = amount.clamp(0.0, self.balance());
        let capital = paid.min(self.cda);
        (capital, paid - capital)
    }

    /// Pay a dividend to the owner. Capital dividends come out of the CDA first.
    pub fn withdraw(&mut self, amount: f64, dividend_refund_rate: f64) -> CorporatePayout {
        let paid = self.buckets.withdraw(amount.min(self.balance()));
        let capital_dividend = paid.min(self.cda);
        self.cda -= capital_dividend;
        let taxable_dividend = paid - capital_dividend;
        let refund = (dividend_refund_rate * taxable_dividend).min(self.rdtoh);
        self.rdtoh -= refund;
        self.buckets.cash += refund;
        CorporatePayout {
            paid,
            capital_dividend,
            taxable_dividend,
            refund,
        }
    }

    /// Earn the year's passive income, pay corporate tax on it and retain the rest
    pub fn accrue_year(&mut self, params: &CorporateTaxParams, inclusion_rate: f64) -> CorporateIncome {
        let distributions = self.buckets.distributions(&self.yields);
        let passive_base = distributions.interest + inclusion_rate * distributions.capital_gains;
        let passive_tax = params.passive_rate * passive_base;
        let portfolio_dividends =
            distributions.eligible_dividends + distributions.non_eligible_dividends;
        let part_iv = params.dividend_refund_rate * portfolio_dividends;
        let refundable_added = params.refundable_rate * passive_base + part_iv;
        let cda_added = (1.0 - inclusion_rate) * distributions.capital_gains;

        self.rdtoh += refundable_added;
        self.cda += cda_added;

        self.buckets.grow(&self.yields);
        let retained = distributions.total() - passive_tax - part_iv;
        if retained >= 0.0 {
            self.buckets.invest += retained;
        } else {
            self.buckets.withdraw(-retained);
        }

        CorporateIncome {
            distributions,
            passive_tax: passive_tax + part_iv,
            refundable_added,
            cda_added,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfsaAccount {
    pub balance: f64,
    /// Contribution room available for the current year
    pub room: f64,
    pub growth: f64,
    pub withdrawn_this_year: f64,
    pub contributed_this_year: f64,
}

impl TfsaAccount {
    pub fn withdraw(&mut self, amount: f64) -> f64 {
        let drawn = amount.clamp(0.0, self.balance);
        self.balance -= drawn;
        if self.balance < DUST {
            self.balance = 0.0;
        }
        self.withdrawn_this_year += drawn;
        drawn
    }

    /// Contribute up to the available room; returns the amount accepted
    pub fn contribute(&mut self, amount: f64) -> f64 {
        let accepted = amount.clamp(0.0, self.room.max(0.0));
        self.balance += accepted;
        self.room -= accepted;
        self.contributed_this_year += accepted;
        accepted
    }

    pub fn grow(&mut self) {
        self.balance = (self.balance * (1.0 + self.growth)).max(0.0);
    }

    /// Close the year: withdrawals come back as room next year, plus the new grant
    pub fn roll_year(&mut self, next_year_grant: f64) {
        self.room += self.withdrawn_this_year + next_year_grant.max(0.0);
        self.withdrawn_this_year = 0.0;
        self.contributed_this_year = 0.0;
    }
}

/// RRSP and RRIF balances of one person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredAccounts {
    pub rrsp: f64,
    pub rrif: f64,
    pub converted: bool,
    pub growth: f64,
}

impl RegisteredAccounts {
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.rrsp + self.rrif
    }

    /// Move the RRSP into the RRIF; returns the amount converted
    pub fn convert(&mut self) -> f64 {
        let moved = self.rrsp;
        self.rrif += moved;
        self.rrsp = 0.0;
        self.converted = true;
        moved
    }

    /// Withdraw from the RRIF first, then the RRSP. Returns `(rrif, rrsp)`.
    pub fn withdraw(&mut self, amount: f64) -> (f64, f64) {
        let mut remaining = amount.max(0.0);
        let from_rrif = remaining.min(self.rrif);
        self.rrif -= from_rrif;
        remaining -= from_rrif;
        let from_rrsp = remaining.min(self.rrsp);
        self.rrsp -= from_rrsp;
        if self.rrif < DUST {
            self.rrif = 0.0;
        }
        if self.rrsp < DUST {
            self.rrsp = 0.0;
        }
        (from_rrif, from_rrsp)
    }

    pub fn grow(&mut self) {
        self.rrsp = (self.rrsp * (1.0 + self.growth)).max(0.0);
        self.rrif = (self.rrif * (1.0 + self.growth)).max(0.0);
    }
}

/// Every account one person holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAccounts {
    pub tfsa: TfsaAccount,
    pub registered: RegisteredAccounts,
    pub nonreg: NonRegisteredAccount,
    pub corporate: CorporateAccount,
}

impl PersonAccounts {
    #[must_use]
    pub fn from_person(person: &Person) -> Self {
        Self {
            tfsa: TfsaAccount {
                balance: person.tfsa,
                room: person.tfsa_room,
                growth: person.tfsa_growth,
                withdrawn_this_year: 0.0,
                contributed_this_year: 0.0,
            },
            registered: RegisteredAccounts {
                rrsp: person.rrsp,
                rrif: person.rrif,
                converted: person.rrif > 0.0,
                growth: person.registered_growth,
            },
            nonreg: NonRegisteredAccount {
                buckets: Buckets::from_split(person.nonreg, person.nonreg_split),
                acb: person.nonreg_acb,
                yields: person.nonreg_yields,
            },
            corporate: CorporateAccount {
                buckets: Buckets::from_split(person.corporate, person.corporate_split),
                yields: person.corporate_yields,
                // Only read when the balance is positive, where validation requires it
                dividend_type: person
                    .corp_dividend_type
                    .unwrap_or(DividendType::NonEligible),
                cda: 0.0,
                rdtoh: 0.0,
            },
        }
    }

    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.tfsa.balance + self.registered.balance() + self.nonreg.balance() + self.corporate.balance()
    }

    /// True when every balance is non-negative
    #[must_use]
    pub fn all_non_negative(&self) -> bool {
        [
            self.tfsa.balance,
            self.registered.rrsp,
            self.registered.rrif,
            self.nonreg.buckets.cash,
            self.nonreg.buckets.gic,
            self.nonreg.buckets.invest,
            self.nonreg.acb,
            self.corporate.buckets.cash,
            self.corporate.buckets.gic,
            self.corporate.buckets.invest,
        ]
        .iter()
        .all(|v| *v >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonreg(balance: f64, acb: f64) -> NonRegisteredAccount {
        NonRegisteredAccount {
            buckets: Buckets::from_split(balance, None),
            acb,
            yields: InvestmentYields::default(),
        }
    }

    #[test]
    fn test_bucket_withdraw_order() {
        let mut buckets = Buckets {
            cash: 1_000.0,
            gic: 2_000.0,
            invest: 5_000.0,
        };
        let drawn = buckets.withdraw(2_500.0);
        assert_eq!(drawn, 2_500.0);
        assert_eq!(buckets.cash, 0.0);
        assert_eq!(buckets.gic, 500.0);
        assert_eq!(buckets.invest, 5_000.0);

        let drawn = buckets.withdraw(10_000.0);
        assert_eq!(drawn, 5_500.0, "cannot draw more than the total");
        assert_eq!(buckets.total(), 0.0);
    }

    #[test]
    fn test_nonreg_withdrawal_releases_acb_pro_rata() {
        let mut account = nonreg(215_000.0, 200_000.0);
        let sale = account.withdraw(43_000.0);
        assert!((sale.proceeds - 43_000.0).abs() < 1e-9);
        assert!((sale.acb_released - 40_000.0).abs() < 1e-6);
        assert!((sale.capital_gain - 3_000.0).abs() < 1e-6);
        assert!((account.acb - 160_000.0).abs() < 1e-6);
        assert!((account.gain_fraction() - 15_000.0 / 215_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_roc_reduces_acb_only() {
        let mut account = nonreg(100_000.0, 80_000.0);
        let dist = Distributions {
            capital_gains: 1_000.0,
            return_of_capital: 2_000.0,
            ..Default::default()
        };
        account.settle_distributions(&dist, false);
        assert_eq!(account.acb, 78_000.0);
        assert_eq!(account.balance(), 100_000.0);

        account.settle_distributions(&dist, true);
        assert_eq!(account.balance(), 103_000.0);
        assert_eq!(account.acb, 79_000.0, "reinvested 3,000 minus RoC 2,000");
    }

    #[test]
    fn test_tfsa_room_returns_next_year() {
        let mut tfsa = TfsaAccount {
            balance: 50_000.0,
            room: 7_000.0,
            growth: 0.0,
            withdrawn_this_year: 0.0,
            contributed_this_year: 0.0,
        };
        assert_eq!(tfsa.withdraw(10_000.0), 10_000.0);
        assert_eq!(tfsa.contribute(20_000.0), 7_000.0, "withdrawals don't refill room this year");
        tfsa.roll_year(7_000.0);
        assert_eq!(tfsa.room, 17_000.0);
    }

    #[test]
    fn test_corporate_payout_uses_cda_then_refunds() {
        let mut corp = CorporateAccount {
            buckets: Buckets::from_split(100_000.0, None),
            yields: InvestmentYields::default(),
            dividend_type: DividendType::Eligible,
            cda: 5_000.0,
            rdtoh: 1_000.0,
        };
        let payout = corp.withdraw(20_000.0, 0.3833);
        assert_eq!(payout.capital_dividend, 5_000.0);
        assert_eq!(payout.taxable_dividend, 15_000.0);
        assert_eq!(payout.refund, 1_000.0, "refund limited by the pool");
        assert!((corp.balance() - 81_000.0).abs() < 1e-9);
        assert_eq!(corp.cda, 0.0);
    }

    #[test]
    fn test_corporate_accrual() {
        let mut corp = CorporateAccount {
            buckets: Buckets::from_split(100_000.0, None),
            yields: InvestmentYields {
                capital_gains_distribution: 0.02,
                ..Default::default()
            },
            dividend_type: DividendType::NonEligible,
            cda: 0.0,
            rdtoh: 0.0,
        };
        let params = CorporateTaxParams::default();
        let income = corp.accrue_year(&params, 0.5);
        assert!((income.cda_added - 1_000.0).abs() < 1e-9);
        assert!((income.passive_tax - 0.4667 * 1_000.0).abs() < 1e-9);
        assert!((corp.rdtoh - 0.3067 * 1_000.0).abs() < 1e-9);
        assert!((corp.balance() - (100_000.0 + 2_000.0 - 466.7)).abs() < 1e-6);
    }

    #[test]
    fn test_registered_withdraw_rrif_then_rrsp() {
        let mut reg = RegisteredAccounts {
            rrsp: 10_000.0,
            rrif: 5_000.0,
            converted: true,
            growth: 0.0,
        };
        assert_eq!(reg.withdraw(8_000.0), (5_000.0, 3_000.0));
        assert_eq!(reg.convert(), 7_000.0);
        assert_eq!(reg.rrif, 7_000.0);
        assert_eq!(reg.rrsp, 0.0);
    }
}
