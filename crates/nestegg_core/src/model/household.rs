//! Household and person inputs
//!
//! A household is one or two participants plus shared settings. Income
//! streams are owned by the household and point at a participant by index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

fn default_tfsa_annual_room() -> f64 {
    7_000.0
}

fn default_gap_tolerance() -> f64 {
    100.0
}

fn default_pension_split_max() -> f64 {
    0.5
}

fn default_end_age() -> u32 {
    95
}

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "Person".to_string()
}

/// Province or territory of residence
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Province {
    AB,
    BC,
    MB,
    NB,
    NL,
    NS,
    NT,
    NU,
    ON,
    PE,
    QC,
    SK,
    YT,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::AB,
        Province::BC,
        Province::MB,
        Province::NB,
        Province::NL,
        Province::NS,
        Province::NT,
        Province::NU,
        Province::ON,
        Province::PE,
        Province::QC,
        Province::SK,
        Province::YT,
    ];

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Province::AB => "AB",
            Province::BC => "BC",
            Province::MB => "MB",
            Province::NB => "NB",
            Province::NL => "NL",
            Province::NS => "NS",
            Province::NT => "NT",
            Province::NU => "NU",
            Province::ON => "ON",
            Province::PE => "PE",
            Province::QC => "QC",
            Province::SK => "SK",
            Province::YT => "YT",
        }
    }

    /// Public pension plan label (presentation only)
    #[must_use]
    pub fn public_pension_label(&self) -> &'static str {
        match self {
            Province::QC => "QPP",
            _ => "CPP",
        }
    }
}

impl FromStr for Province {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Province::ALL
            .into_iter()
            .find(|p| p.code() == upper)
            .ok_or_else(|| InputError::UnknownProvince(s.to_string()))
    }
}

/// Withdrawal strategy catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    MinimizeIncome,
    RrifFrontload,
    TfsaFirst,
    CorporateOptimized,
    Balanced,
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::MinimizeIncome,
        Strategy::RrifFrontload,
        Strategy::TfsaFirst,
        Strategy::CorporateOptimized,
        Strategy::Balanced,
        Strategy::Hybrid,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::MinimizeIncome => "minimize-income",
            Strategy::RrifFrontload => "rrif-frontload",
            Strategy::TfsaFirst => "tfsa-first",
            Strategy::CorporateOptimized => "corporate-optimized",
            Strategy::Balanced => "balanced",
            Strategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| InputError::UnknownStrategy(s.to_string()))
    }
}

/// How dividends paid out of a corporate account are taxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendType {
    Eligible,
    NonEligible,
}

/// Fractions of an account held in each sub-bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketSplit {
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub gic: f64,
    #[serde(default)]
    pub invest: f64,
}

impl Default for BucketSplit {
    fn default() -> Self {
        Self {
            cash: 0.0,
            gic: 0.0,
            invest: 1.0,
        }
    }
}

/// Yields per sub-bucket, as fractions of the bucket balance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentYields {
    pub cash_interest: f64,
    pub gic_interest: f64,
    pub eligible_dividend: f64,
    pub non_eligible_dividend: f64,
    pub capital_gains_distribution: f64,
    pub return_of_capital: f64,
    /// Price appreciation of the invest bucket (stays inside the account)
    pub price_growth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeKind {
    /// Employer pension (eligible pension income at any age)
    Pension,
    /// Taxed as ordinary income
    Other,
}

/// Annual income stream owned by a participant (by index)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStream {
    #[serde(default)]
    pub name: String,
    /// 0 for the first person, 1 for the partner
    #[serde(default)]
    pub owner: usize,
    pub kind: IncomeKind,
    /// Amount per year at `start_age`, in start-year dollars
    pub annual_amount: f64,
    pub start_age: u32,
    #[serde(default)]
    pub end_age: Option<u32>,
    #[serde(default = "default_true")]
    pub indexed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyRrifMode {
    /// Withdraw `fixed_amount` each year
    Fixed,
    /// Withdraw `percentage` of the January 1 balance each year
    Percentage,
}

/// Elective RRIF withdrawals before the mandatory conversion age.
///
/// When enabled, the RRSP converts at `start_age` instead of 71.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyRrifWithdrawal {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub start_age: u32,
    pub end_age: u32,
    pub mode: EarlyRrifMode,
    #[serde(default)]
    pub fixed_amount: f64,
    #[serde(default)]
    pub percentage: f64,
}

impl EarlyRrifWithdrawal {
    #[must_use]
    pub fn active_at(&self, age: u32) -> bool {
        self.enabled && (self.start_age..=self.end_age).contains(&age)
    }

    /// Requested amount for the year given the registered balance on January 1
    #[must_use]
    pub fn amount(&self, start_balance: f64) -> f64 {
        let requested = match self.mode {
            EarlyRrifMode::Fixed => self.fixed_amount,
            EarlyRrifMode::Percentage => self.percentage * start_balance,
        };
        requested.clamp(0.0, start_balance.max(0.0))
    }
}

/// One participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default = "default_name")]
    pub name: String,
    pub start_age: u32,

    #[serde(default)]
    pub tfsa: f64,
    #[serde(default)]
    pub rrsp: f64,
    #[serde(default)]
    pub rrif: f64,
    #[serde(default)]
    pub nonreg: f64,
    #[serde(default)]
    pub corporate: f64,
    #[serde(default)]
    pub nonreg_acb: f64,

    #[serde(default)]
    pub nonreg_split: Option<BucketSplit>,
    #[serde(default)]
    pub corporate_split: Option<BucketSplit>,
    #[serde(default)]
    pub nonreg_yields: InvestmentYields,
    #[serde(default)]
    pub corporate_yields: InvestmentYields,
    /// Required when `corporate > 0`
    #[serde(default)]
    pub corp_dividend_type: Option<DividendType>,

    /// Annual growth of RRSP/RRIF balances
    #[serde(default)]
    pub registered_growth: f64,
    #[serde(default)]
    pub tfsa_growth: f64,

    #[serde(default = "default_cpp_start_age")]
    pub cpp_start_age: u32,
    /// Annual CPP/QPP amount at `cpp_start_age`, in start-year dollars
    #[serde(default)]
    pub cpp_annual_at_start: f64,
    #[serde(default = "default_cpp_start_age")]
    pub oas_start_age: u32,
    /// Annual OAS amount at `oas_start_age`, deferral bonus included
    #[serde(default)]
    pub oas_annual_at_start: f64,

    /// Contribution room available in the start year
    #[serde(default)]
    pub tfsa_room: f64,
    #[serde(default)]
    pub early_rrif: Option<EarlyRrifWithdrawal>,
    #[serde(default)]
    pub disability: bool,
}

fn default_cpp_start_age() -> u32 {
    65
}

impl Person {
    /// Age during the given simulation year
    #[must_use]
    pub fn age_in(&self, start_year: i32, year: i32) -> u32 {
        let elapsed = (year - start_year).max(0) as u32;
        self.start_age + elapsed
    }

    fn validate(&self) -> Result<(), InputError> {
        for (account, value) in [
            ("tfsa", self.tfsa),
            ("rrsp", self.rrsp),
            ("rrif", self.rrif),
            ("nonreg", self.nonreg),
            ("corporate", self.corporate),
            ("nonreg_acb", self.nonreg_acb),
            ("tfsa_room", self.tfsa_room),
            ("cpp_annual_at_start", self.cpp_annual_at_start),
            ("oas_annual_at_start", self.oas_annual_at_start),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFinite {
                    field: format!("{}.{account}", self.name),
                });
            }
            if value < 0.0 {
                return Err(InputError::NegativeBalance {
                    person: self.name.clone(),
                    account,
                    value,
                });
            }
        }

        for (field, value) in [
            ("registered_growth", self.registered_growth),
            ("tfsa_growth", self.tfsa_growth),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFinite {
                    field: format!("{}.{field}", self.name),
                });
            }
        }

        for (label, yields) in [
            ("nonreg_yields", &self.nonreg_yields),
            ("corporate_yields", &self.corporate_yields),
        ] {
            let values = [
                yields.cash_interest,
                yields.gic_interest,
                yields.eligible_dividend,
                yields.non_eligible_dividend,
                yields.capital_gains_distribution,
                yields.return_of_capital,
                yields.price_growth,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(InputError::NonFinite {
                    field: format!("{}.{label}", self.name),
                });
            }
        }

        for (label, split) in [
            ("nonreg_split", self.nonreg_split),
            ("corporate_split", self.corporate_split),
        ] {
            if let Some(split) = split {
                let total = split.cash + split.gic + split.invest;
                let parts_ok = [split.cash, split.gic, split.invest]
                    .iter()
                    .all(|v| v.is_finite() && *v >= 0.0);
                if !parts_ok || (total - 1.0).abs() > 1e-6 {
                    return Err(InputError::InvalidFraction {
                        field: format!("{}.{label} (sum)", self.name),
                        value: total,
                    });
                }
            }
        }

        if self.corporate > 0.0 && self.corp_dividend_type.is_none() {
            return Err(InputError::MissingDividendType {
                person: self.name.clone(),
            });
        }

        if let Some(early) = &self.early_rrif
            && early.enabled
        {
            if early.start_age > early.end_age {
                return Err(InputError::AgeOrdering {
                    field: "early_rrif",
                    reason: format!(
                        "{}: start_age {} is after end_age {}",
                        self.name, early.start_age, early.end_age
                    ),
                });
            }
            if early.mode == EarlyRrifMode::Percentage && !(0.0..=1.0).contains(&early.percentage)
            {
                return Err(InputError::InvalidFraction {
                    field: format!("{}.early_rrif.percentage", self.name),
                    value: early.percentage,
                });
            }
            if !early.fixed_amount.is_finite() || early.fixed_amount < 0.0 {
                return Err(InputError::NegativeBalance {
                    person: self.name.clone(),
                    account: "early_rrif.fixed_amount",
                    value: early.fixed_amount,
                });
            }
        }

        Ok(())
    }
}

/// The planning unit: one or two participants plus shared settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub p1: Person,
    #[serde(default)]
    pub p2: Option<Person>,
    #[serde(default)]
    pub include_partner: bool,
    pub province: Province,
    pub start_year: i32,
    #[serde(default = "default_end_age")]
    pub end_age: u32,
    pub strategy: Strategy,

    /// After-tax spending targets in start-year dollars
    pub spending_go_go: f64,
    #[serde(default)]
    pub spending_slow_go: Option<f64>,
    #[serde(default)]
    pub spending_no_go: Option<f64>,
    /// First age (of the senior partner) in the slow-go phase
    #[serde(default = "default_slow_go_age")]
    pub slow_go_age: u32,
    /// First age (of the senior partner) in the no-go phase
    #[serde(default = "default_no_go_age")]
    pub no_go_age: u32,

    #[serde(default)]
    pub general_inflation: f64,
    #[serde(default)]
    pub spending_inflation: f64,
    /// Annual TFSA room grant in start-year dollars
    #[serde(default = "default_tfsa_annual_room")]
    pub tfsa_annual_room: f64,
    /// Shortfall (in dollars) below which a year still counts as funded
    #[serde(default = "default_gap_tolerance")]
    pub gap_tolerance: f64,
    #[serde(default)]
    pub reinvest_nonreg_dist: bool,
    /// Upper bound on the fraction of eligible pension income that may be split
    #[serde(default = "default_pension_split_max")]
    pub pension_split_max: f64,
    /// RRIF withdrawal floor used by the hybrid strategy
    #[serde(default)]
    pub hybrid_topup_amount: f64,
    #[serde(default)]
    pub stop_on_fail: bool,
    #[serde(default)]
    pub income_streams: Vec<IncomeStream>,
}

fn default_slow_go_age() -> u32 {
    75
}

fn default_no_go_age() -> u32 {
    85
}

impl Household {
    /// Participants in simulation order (one or two)
    #[must_use]
    pub fn participants(&self) -> Vec<&Person> {
        let mut people = vec![&self.p1];
        if self.include_partner
            && let Some(p2) = &self.p2
        {
            people.push(p2);
        }
        people
    }

    #[must_use]
    pub fn is_couple(&self) -> bool {
        self.include_partner && self.p2.is_some()
    }

    /// Number of simulated years: until the first participant reaches `end_age`
    #[must_use]
    pub fn horizon_years(&self) -> u32 {
        self.participants()
            .iter()
            .map(|p| self.end_age.saturating_sub(p.start_age) + 1)
            .min()
            .unwrap_or(0)
    }

    /// Spending target for the year in start-year dollars
    #[must_use]
    pub fn base_spending_for_age(&self, senior_age: u32) -> f64 {
        let slow_go = self.spending_slow_go.unwrap_or(self.spending_go_go);
        let no_go = self.spending_no_go.unwrap_or(slow_go);
        if senior_age >= self.no_go_age {
            no_go
        } else if senior_age >= self.slow_go_age {
            slow_go
        } else {
            self.spending_go_go
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.include_partner && self.p2.is_none() {
            return Err(InputError::MissingPartner);
        }

        for person in self.participants() {
            person.validate()?;
            if person.start_age > self.end_age {
                return Err(InputError::AgeOrdering {
                    field: "end_age",
                    reason: format!(
                        "{} starts at {} but the plan ends at {}",
                        person.name, person.start_age, self.end_age
                    ),
                });
            }
        }

        if self.slow_go_age > self.no_go_age {
            return Err(InputError::AgeOrdering {
                field: "slow_go_age",
                reason: format!(
                    "slow_go_age {} is after no_go_age {}",
                    self.slow_go_age, self.no_go_age
                ),
            });
        }

        let spending = [
            Some(self.spending_go_go),
            self.spending_slow_go,
            self.spending_no_go,
        ];
        for value in spending.into_iter().flatten() {
            if !value.is_finite() {
                return Err(InputError::NonFinite {
                    field: "spending".into(),
                });
            }
            if value < 0.0 {
                return Err(InputError::NegativeBalance {
                    person: "household".into(),
                    account: "spending",
                    value,
                });
            }
        }

        for (field, value) in [
            ("general_inflation", self.general_inflation),
            ("spending_inflation", self.spending_inflation),
            ("tfsa_annual_room", self.tfsa_annual_room),
            ("gap_tolerance", self.gap_tolerance),
            ("hybrid_topup_amount", self.hybrid_topup_amount),
        ] {
            if !value.is_finite() {
                return Err(InputError::NonFinite {
                    field: field.into(),
                });
            }
        }
        if self.gap_tolerance < 0.0 {
            return Err(InputError::NegativeBalance {
                person: "household".into(),
                account: "gap_tolerance",
                value: self.gap_tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.pension_split_max) {
            return Err(InputError::InvalidFraction {
                field: "pension_split_max".into(),
                value: self.pension_split_max,
            });
        }

        let people = self.participants().len();
        for stream in &self.income_streams {
            if stream.owner >= people {
                return Err(InputError::UnknownOwner {
                    stream: stream.name.clone(),
                    owner: stream.owner,
                });
            }
            if !stream.annual_amount.is_finite() || stream.annual_amount < 0.0 {
                return Err(InputError::NegativeBalance {
                    person: stream.name.clone(),
                    account: "income stream",
                    value: stream.annual_amount,
                });
            }
            if let Some(end) = stream.end_age
                && end < stream.start_age
            {
                return Err(InputError::AgeOrdering {
                    field: "income_streams",
                    reason: format!(
                        "{}: end_age {} is before start_age {}",
                        stream.name, end, stream.start_age
                    ),
                });
            }
        }

        Ok(())
    }
}
