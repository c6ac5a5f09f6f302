//! Withdrawal strategies as data
//!
//! Each strategy is an ordered list of sources used to fill a spending
//! shortfall, plus optional registered-account rules (a soft cap for
//! `rrif-frontload`, a proactive floor for `hybrid`).

use crate::model::Strategy;

/// A place the planner can draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillSource {
    Tfsa,
    NonRegistered,
    Corporate,
    /// Corporate, but only the dividends that leave the person's tax unchanged
    CorporateTaxFree,
    /// RRIF, then any unconverted RRSP
    Registered,
    /// Registered, but only up to the strategy's cap
    RegisteredToCap,
    /// Registered, non-registered and corporate in proportion to their balances
    Balanced,
}

/// Fraction of the January 1 RRIF balance `rrif-frontload` aims to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrifCap {
    pub before_oas: f64,
    pub after_oas: f64,
}

impl RrifCap {
    /// Dollar cap for the year
    #[must_use]
    pub fn amount(&self, start_balance: f64, oas_started: bool) -> f64 {
        let pct = if oas_started {
            self.after_oas
        } else {
            self.before_oas
        };
        pct * start_balance.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyPlan {
    pub strategy: Strategy,
    pub order: &'static [FillSource],
    pub rrif_cap: Option<RrifCap>,
    /// Draw the household's `hybrid_topup_amount` from registered accounts every year
    pub registered_topup: bool,
}

// Dividends sheltered by unused credits cost nothing, so they go ahead of non-reg
const MINIMIZE_INCOME: &[FillSource] = &[
    FillSource::CorporateTaxFree,
    FillSource::NonRegistered,
    FillSource::Tfsa,
    FillSource::Registered,
    FillSource::Corporate,
];

// Past the cap the registered account is drawn again, and the row is flagged
const RRIF_FRONTLOAD: &[FillSource] = &[
    FillSource::RegisteredToCap,
    FillSource::Corporate,
    FillSource::NonRegistered,
    FillSource::Tfsa,
    FillSource::Registered,
];

const TFSA_FIRST: &[FillSource] = &[
    FillSource::Tfsa,
    FillSource::Registered,
    FillSource::NonRegistered,
    FillSource::Corporate,
];

const CORPORATE_OPTIMIZED: &[FillSource] = &[
    FillSource::Corporate,
    FillSource::Registered,
    FillSource::NonRegistered,
    FillSource::Tfsa,
];

const BALANCED: &[FillSource] = &[FillSource::Balanced, FillSource::Tfsa];

impl Strategy {
    #[must_use]
    pub fn plan(&self) -> StrategyPlan {
        let (order, rrif_cap, registered_topup) = match self {
            Strategy::MinimizeIncome => (MINIMIZE_INCOME, None, false),
            Strategy::RrifFrontload => (
                RRIF_FRONTLOAD,
                Some(RrifCap {
                    before_oas: 0.15,
                    after_oas: 0.08,
                }),
                false,
            ),
            Strategy::TfsaFirst => (TFSA_FIRST, None, false),
            Strategy::CorporateOptimized => (CORPORATE_OPTIMIZED, None, false),
            Strategy::Balanced => (BALANCED, None, false),
            Strategy::Hybrid => (BALANCED, None, true),
        };
        StrategyPlan {
            strategy: *self,
            order,
            rrif_cap,
            registered_topup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_strategy_ends_with_tfsa_or_registered() {
        for strategy in Strategy::ALL {
            let plan = strategy.plan();
            assert!(!plan.order.is_empty(), "{strategy} has no sources");
            assert!(
                plan.order.contains(&FillSource::Tfsa),
                "{strategy} never touches the TFSA"
            );
        }
    }

    #[test]
    fn test_frontload_cap() {
        let cap = Strategy::RrifFrontload.plan().rrif_cap.unwrap();
        assert!((cap.amount(100_000.0, false) - 15_000.0).abs() < 1e-9);
        assert!((cap.amount(100_000.0, true) - 8_000.0).abs() < 1e-9);
        assert!(Strategy::Balanced.plan().rrif_cap.is_none());
    }

    #[test]
    fn test_only_minimize_income_uses_tax_free_dividends() {
        for strategy in Strategy::ALL {
            let plan = strategy.plan();
            let uses = plan.order.contains(&FillSource::CorporateTaxFree);
            assert_eq!(uses, strategy == Strategy::MinimizeIncome, "{strategy}");
        }
        assert_eq!(
            Strategy::MinimizeIncome.plan().order[0],
            FillSource::CorporateTaxFree
        );
    }

    #[test]
    fn test_hybrid_is_balanced_with_topup() {
        let hybrid = Strategy::Hybrid.plan();
        assert_eq!(hybrid.order, Strategy::Balanced.plan().order);
        assert!(hybrid.registered_topup);
    }
}
