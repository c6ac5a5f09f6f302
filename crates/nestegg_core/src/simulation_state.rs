use crate::model::{Household, PersonAccounts, YearResult};

/// Runtime state carried from one year to the next
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Calendar year about to be simulated
    pub year: i32,
    /// Accounts per participant, in household order
    pub accounts: Vec<PersonAccounts>,
    /// Rows recorded so far
    pub years: Vec<YearResult>,
}

impl SimulationState {
    #[must_use]
    pub fn from_household(household: &Household) -> Self {
        Self {
            year: household.start_year,
            accounts: household
                .participants()
                .into_iter()
                .map(PersonAccounts::from_person)
                .collect(),
            years: Vec::with_capacity(household.horizon_years() as usize),
        }
    }

    /// Years elapsed since the start year
    #[must_use]
    pub fn elapsed(&self, household: &Household) -> i32 {
        self.year - household.start_year
    }

    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.accounts.iter().map(PersonAccounts::net_worth).sum()
    }

    pub fn advance_year(&mut self) {
        self.year += 1;
    }
}
