//! Property-based invariants

use proptest::prelude::{prop_assert, proptest};

use crate::config::{HouseholdBuilder, PersonBuilder};
use crate::model::{DividendType, Province, RrifMinimumTable, Strategy, TaxConfig};
use crate::simulation::simulate;
use crate::taxes::{IncomeBreakdown, TaxContext};

const CONFIGURED: [Province; 5] = [
    Province::AB,
    Province::BC,
    Province::ON,
    Province::QC,
    Province::SK,
];

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_net_tax_is_finite_and_non_negative(
        province in 0usize..5,
        age in 50u32..100,
        ordinary in 0u32..400_000,
        pension in 0u32..150_000,
        eligible in 0u32..200_000,
        non_eligible in 0u32..100_000,
        gains in 0u32..300_000,
        oas in 0u32..12_000,
        disability in proptest::bool::ANY,
    ) {
        let config = TaxConfig::canada_2025();
        let ctx = TaxContext::new(&config, CONFIGURED[province]).unwrap();
        let income = IncomeBreakdown {
            ordinary: f64::from(ordinary),
            pension: f64::from(pension),
            eligible_dividends: f64::from(eligible),
            non_eligible_dividends: f64::from(non_eligible),
            capital_gains: f64::from(gains),
            oas_received: f64::from(oas),
            ..Default::default()
        };
        let tax = ctx.person_tax(age, &income, disability);
        prop_assert!(tax.net_tax.is_finite());
        prop_assert!(tax.net_tax >= 0.0, "negative tax {}", tax.net_tax);
        prop_assert!(tax.federal.oas_clawback <= f64::from(oas) + 1e-9);
        prop_assert!((0.0..1.0).contains(&tax.marginal_rate));
    }

    #[test]
    fn prop_rrif_minimum_is_monotone_in_balance(
        age in 55u32..100,
        low in 0u32..2_000_000,
        extra in 0u32..2_000_000,
    ) {
        let table = RrifMinimumTable::canada_2025();
        let low = f64::from(low);
        let high = low + f64::from(extra);
        let a = table.minimum_withdrawal(age, low);
        let b = table.minimum_withdrawal(age, high);
        prop_assert!(a <= b + 1e-9);
        prop_assert!(b <= high + 1e-9, "minimum never exceeds the balance");
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(24))]

    #[test]
    fn prop_short_runs_keep_accounts_sound(
        strategy in 0usize..6,
        province in 0usize..5,
        age in 55u32..86,
        tfsa in 0u32..300_000,
        rrsp in 0u32..600_000,
        rrif in 0u32..600_000,
        nonreg in 0u32..500_000,
        gain_pct in 0u32..80,
        corporate in 0u32..800_000,
        growth_bp in 0u32..800,
        spending in 10_000u32..150_000,
        couple in proptest::bool::ANY,
    ) {
        let nonreg = f64::from(nonreg);
        let acb = nonreg * (1.0 - f64::from(gain_pct) / 100.0);
        let growth = f64::from(growth_bp) / 10_000.0;
        let person = |name: &str| {
            PersonBuilder::new(name, age)
                .tfsa(f64::from(tfsa))
                .rrsp(f64::from(rrsp))
                .rrif(f64::from(rrif))
                .nonreg(nonreg, acb)
                .corporate(f64::from(corporate), DividendType::NonEligible)
                .growth(growth, growth)
                .cpp(65, 10_000.0)
                .oas(65, 8_500.0)
        };
        let mut builder = HouseholdBuilder::new(person("A"))
            .province(CONFIGURED[province])
            .strategy(Strategy::ALL[strategy])
            .spending(f64::from(spending))
            .inflation(0.02, 0.02)
            .end_age(age + 4);
        if couple {
            builder = builder.partner(person("B"));
        }
        let household = builder.build();

        let result = simulate(&household, &TaxConfig::canada_2025()).unwrap();
        prop_assert!(result.years.len() == 5);
        for year in &result.years {
            for (field, value) in year.numeric_fields() {
                prop_assert!(value.is_finite(), "{field} is {value}");
            }
            for balance in [
                year.tfsa_end_p1, year.rrsp_end_p1, year.rrif_end_p1,
                year.nonreg_end_p1, year.corporate_end_p1,
                year.tfsa_end_p2, year.rrsp_end_p2, year.rrif_end_p2,
                year.nonreg_end_p2, year.corporate_end_p2,
            ] {
                prop_assert!(balance >= 0.0, "{}: negative balance {balance}", year.year);
            }
            if year.plan_success {
                prop_assert!(year.spending_gap <= household.gap_tolerance + 1e-9);
            }
            prop_assert!(year.rrif_withdrawal_p1 >= year.rrif_minimum_p1 - 1e-6);
            prop_assert!(year.rrif_withdrawal_p2 >= year.rrif_minimum_p2 - 1e-6);
            prop_assert!(year.spending_met <= year.spending_need + 1e-9);
        }

        let again = simulate(&household, &TaxConfig::canada_2025()).unwrap();
        prop_assert!(again == result, "same inputs must give the same rows");
    }
}
