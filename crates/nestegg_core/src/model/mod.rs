mod accounts;
mod household;
mod results;
mod schedules;
mod tax_config;

pub use accounts::{
    Buckets, CorporateAccount, CorporateIncome, CorporatePayout, DUST, Disposition,
    Distributions, NonRegisteredAccount, PersonAccounts, RegisteredAccounts, TfsaAccount,
};
pub use household::{
    BucketSplit, DividendType, EarlyRrifMode, EarlyRrifWithdrawal, Household, IncomeKind,
    IncomeStream, InvestmentYields, Person, Province, Strategy,
};
pub use results::{
    FUNDED_GAP_EPSILON, PersonYear, SimulationResult, SimulationSummary, YearResult,
};
pub use schedules::{
    CPP_EARLIEST_START, CPP_LATEST_START, OAS_EARLIEST_START, OAS_LATEST_START,
    RRIF_CONVERSION_AGE, RRIF_TABLE_LAST_AGE, RrifMinimumTable, clamp_oas_start,
    cpp_start_factor, oas_deferral_factor,
};
pub use tax_config::{
    CorporateTaxParams, Credits, DividendParams, GisParams, JurisdictionParams, OasClawback,
    TaxBracket, TaxConfig,
};
