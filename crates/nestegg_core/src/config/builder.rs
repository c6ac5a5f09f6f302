use crate::model::{
    BucketSplit, DividendType, EarlyRrifMode, EarlyRrifWithdrawal, Household, IncomeKind,
    IncomeStream, InvestmentYields, Person, Province, Strategy, cpp_start_factor,
    oas_deferral_factor,
};

/// Builder for one participant
#[derive(Debug, Clone)]
pub struct PersonBuilder {
    person: Person,
}

impl PersonBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, start_age: u32) -> Self {
        Self {
            person: Person {
                name: name.into(),
                start_age,
                tfsa: 0.0,
                rrsp: 0.0,
                rrif: 0.0,
                nonreg: 0.0,
                corporate: 0.0,
                nonreg_acb: 0.0,
                nonreg_split: None,
                corporate_split: None,
                nonreg_yields: InvestmentYields::default(),
                corporate_yields: InvestmentYields::default(),
                corp_dividend_type: None,
                registered_growth: 0.0,
                tfsa_growth: 0.0,
                cpp_start_age: 65,
                cpp_annual_at_start: 0.0,
                oas_start_age: 65,
                oas_annual_at_start: 0.0,
                tfsa_room: 0.0,
                early_rrif: None,
                disability: false,
            },
        }
    }

    // =========================================================================
    // Balances
    // =========================================================================

    #[must_use]
    pub fn tfsa(mut self, balance: f64) -> Self {
        self.person.tfsa = balance;
        self
    }

    #[must_use]
    pub fn rrsp(mut self, balance: f64) -> Self {
        self.person.rrsp = balance;
        self
    }

    #[must_use]
    pub fn rrif(mut self, balance: f64) -> Self {
        self.person.rrif = balance;
        self
    }

    /// Non-registered balance with its adjusted cost base
    #[must_use]
    pub fn nonreg(mut self, balance: f64, acb: f64) -> Self {
        self.person.nonreg = balance;
        self.person.nonreg_acb = acb;
        self
    }

    #[must_use]
    pub fn corporate(mut self, balance: f64, dividend_type: DividendType) -> Self {
        self.person.corporate = balance;
        self.person.corp_dividend_type = Some(dividend_type);
        self
    }

    #[must_use]
    pub fn nonreg_split(mut self, cash: f64, gic: f64, invest: f64) -> Self {
        self.person.nonreg_split = Some(BucketSplit { cash, gic, invest });
        self
    }

    #[must_use]
    pub fn corporate_split(mut self, cash: f64, gic: f64, invest: f64) -> Self {
        self.person.corporate_split = Some(BucketSplit { cash, gic, invest });
        self
    }

    #[must_use]
    pub fn nonreg_yields(mut self, yields: InvestmentYields) -> Self {
        self.person.nonreg_yields = yields;
        self
    }

    #[must_use]
    pub fn corporate_yields(mut self, yields: InvestmentYields) -> Self {
        self.person.corporate_yields = yields;
        self
    }

    /// Annual growth of registered and TFSA balances
    #[must_use]
    pub fn growth(mut self, registered: f64, tfsa: f64) -> Self {
        self.person.registered_growth = registered;
        self.person.tfsa_growth = tfsa;
        self
    }

    #[must_use]
    pub fn tfsa_room(mut self, room: f64) -> Self {
        self.person.tfsa_room = room;
        self
    }

    // =========================================================================
    // Public pensions
    // =========================================================================

    /// CPP/QPP starting at `start_age` with the amount payable at that age
    #[must_use]
    pub fn cpp(mut self, start_age: u32, annual: f64) -> Self {
        self.person.cpp_start_age = start_age;
        self.person.cpp_annual_at_start = annual;
        self
    }

    /// CPP/QPP from the age-65 entitlement, adjusted for an early or late start
    #[must_use]
    pub fn cpp_from_65(self, start_age: u32, annual_at_65: f64) -> Self {
        self.cpp(start_age, annual_at_65 * cpp_start_factor(start_age))
    }

    /// OAS starting at `start_age` with the amount payable at that age
    #[must_use]
    pub fn oas(mut self, start_age: u32, annual: f64) -> Self {
        self.person.oas_start_age = start_age;
        self.person.oas_annual_at_start = annual;
        self
    }

    /// OAS from the age-65 amount, with the deferral bonus applied
    #[must_use]
    pub fn oas_from_65(self, start_age: u32, annual_at_65: f64) -> Self {
        self.oas(start_age, annual_at_65 * oas_deferral_factor(start_age))
    }

    // =========================================================================
    // Early RRIF and credits
    // =========================================================================

    #[must_use]
    pub fn early_rrif_fixed(mut self, start_age: u32, end_age: u32, amount: f64) -> Self {
        self.person.early_rrif = Some(EarlyRrifWithdrawal {
            enabled: true,
            start_age,
            end_age,
            mode: EarlyRrifMode::Fixed,
            fixed_amount: amount,
            percentage: 0.0,
        });
        self
    }

    #[must_use]
    pub fn early_rrif_percentage(mut self, start_age: u32, end_age: u32, percentage: f64) -> Self {
        self.person.early_rrif = Some(EarlyRrifWithdrawal {
            enabled: true,
            start_age,
            end_age,
            mode: EarlyRrifMode::Percentage,
            fixed_amount: 0.0,
            percentage,
        });
        self
    }

    #[must_use]
    pub fn disability(mut self) -> Self {
        self.person.disability = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Person {
        self.person
    }
}

/// Builder for a one- or two-person household
#[derive(Debug, Clone)]
pub struct HouseholdBuilder {
    household: Household,
}

impl HouseholdBuilder {
    #[must_use]
    pub fn new(p1: PersonBuilder) -> Self {
        Self {
            household: Household {
                p1: p1.build(),
                p2: None,
                include_partner: false,
                province: Province::ON,
                start_year: 2025,
                end_age: 95,
                strategy: Strategy::MinimizeIncome,
                spending_go_go: 0.0,
                spending_slow_go: None,
                spending_no_go: None,
                slow_go_age: 75,
                no_go_age: 85,
                general_inflation: 0.0,
                spending_inflation: 0.0,
                tfsa_annual_room: 7_000.0,
                gap_tolerance: 100.0,
                reinvest_nonreg_dist: false,
                pension_split_max: 0.5,
                hybrid_topup_amount: 0.0,
                stop_on_fail: false,
                income_streams: Vec::new(),
            },
        }
    }

    /// Add a partner and switch to couple mode
    #[must_use]
    pub fn partner(mut self, p2: PersonBuilder) -> Self {
        self.household.p2 = Some(p2.build());
        self.household.include_partner = true;
        self
    }

    #[must_use]
    pub fn province(mut self, province: Province) -> Self {
        self.household.province = province;
        self
    }

    #[must_use]
    pub fn start_year(mut self, year: i32) -> Self {
        self.household.start_year = year;
        self
    }

    #[must_use]
    pub fn end_age(mut self, age: u32) -> Self {
        self.household.end_age = age;
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.household.strategy = strategy;
        self
    }

    /// Same after-tax spending in every phase
    #[must_use]
    pub fn spending(mut self, go_go: f64) -> Self {
        self.household.spending_go_go = go_go;
        self.household.spending_slow_go = None;
        self.household.spending_no_go = None;
        self
    }

    #[must_use]
    pub fn spending_phases(mut self, go_go: f64, slow_go: f64, no_go: f64) -> Self {
        self.household.spending_go_go = go_go;
        self.household.spending_slow_go = Some(slow_go);
        self.household.spending_no_go = Some(no_go);
        self
    }

    #[must_use]
    pub fn phase_ages(mut self, slow_go_age: u32, no_go_age: u32) -> Self {
        self.household.slow_go_age = slow_go_age;
        self.household.no_go_age = no_go_age;
        self
    }

    #[must_use]
    pub fn inflation(mut self, general: f64, spending: f64) -> Self {
        self.household.general_inflation = general;
        self.household.spending_inflation = spending;
        self
    }

    #[must_use]
    pub fn tfsa_annual_room(mut self, room: f64) -> Self {
        self.household.tfsa_annual_room = room;
        self
    }

    #[must_use]
    pub fn gap_tolerance(mut self, tolerance: f64) -> Self {
        self.household.gap_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn reinvest_distributions(mut self, reinvest: bool) -> Self {
        self.household.reinvest_nonreg_dist = reinvest;
        self
    }

    #[must_use]
    pub fn pension_split_max(mut self, fraction: f64) -> Self {
        self.household.pension_split_max = fraction;
        self
    }

    #[must_use]
    pub fn hybrid_topup(mut self, amount: f64) -> Self {
        self.household.hybrid_topup_amount = amount;
        self
    }

    #[must_use]
    pub fn stop_on_fail(mut self) -> Self {
        self.household.stop_on_fail = true;
        self
    }

    /// Indexed employer pension paid to participant `owner` from `start_age`
    #[must_use]
    pub fn pension(self, owner: usize, name: &str, annual: f64, start_age: u32) -> Self {
        self.income(IncomeStream {
            name: name.to_string(),
            owner,
            kind: IncomeKind::Pension,
            annual_amount: annual,
            start_age,
            end_age: None,
            indexed: true,
        })
    }

    #[must_use]
    pub fn income(mut self, stream: IncomeStream) -> Self {
        self.household.income_streams.push(stream);
        self
    }

    #[must_use]
    pub fn build(self) -> Household {
        self.household
    }
}
