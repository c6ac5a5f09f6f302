//! Tax configuration types
//!
//! Bracket tables, credit amounts, dividend factors and clawback parameters
//! for the federal jurisdiction and each province. The calculation itself
//! lives in the `taxes` module.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::household::Province;
use super::schedules::RrifMinimumTable;
use crate::error::ConfigError;

fn default_senior_age() -> u32 {
    65
}

fn default_age_phaseout_rate() -> f64 {
    0.15
}

fn default_inclusion_rate() -> f64 {
    0.5
}

/// A single bracket in a progressive schedule.
///
/// `rate` applies to income from `threshold` up to the next entry's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(alias = "th")]
    pub threshold: f64,
    pub rate: f64,
}

/// Non-refundable credit amounts, in dollars of income (multiplied by the
/// lowest bracket rate when applied)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    pub basic_personal: f64,
    #[serde(default)]
    pub age_amount: f64,
    /// Income above which the age amount is phased out
    #[serde(default)]
    pub age_threshold: f64,
    #[serde(default = "default_age_phaseout_rate")]
    pub age_phaseout_rate: f64,
    #[serde(default = "default_senior_age")]
    pub age_credit_min_age: u32,
    /// Cap on eligible pension income claimed for the pension credit
    #[serde(default)]
    pub pension_amount: f64,
    /// Age from which RRIF withdrawals count as eligible pension income
    #[serde(default = "default_senior_age")]
    pub pension_credit_min_age: u32,
    #[serde(default)]
    pub disability: f64,
}

/// Dividend gross-up factors and credit rates (credit rates apply to the
/// grossed-up amount)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendParams {
    pub gross_up_elig: f64,
    pub cred_elig: f64,
    pub gross_up_nonelig: f64,
    pub cred_nonelig: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OasClawback {
    pub threshold: f64,
    pub rate: f64,
}

/// Everything needed to tax one person in one jurisdiction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionParams {
    /// Must be sorted by threshold ascending, starting at zero
    pub brackets: Vec<TaxBracket>,
    pub credits: Credits,
    pub dividend: DividendParams,
    #[serde(default = "default_inclusion_rate")]
    pub capital_gains_inclusion: f64,
    /// Only the federal block carries a clawback
    #[serde(default)]
    pub oas_clawback: Option<OasClawback>,
    /// Fraction of basic federal tax refunded to residents (Quebec abatement)
    #[serde(default)]
    pub federal_abatement: f64,
}

impl JurisdictionParams {
    /// Rate used to convert credit amounts into tax
    #[must_use]
    pub fn lowest_rate(&self) -> f64 {
        self.brackets.first().map(|b| b.rate).unwrap_or(0.0)
    }

    pub fn validate(&self, jurisdiction: &str) -> Result<(), ConfigError> {
        let first = self.brackets.first().ok_or_else(|| ConfigError::EmptyBrackets {
            jurisdiction: jurisdiction.to_string(),
        })?;
        if first.threshold != 0.0 {
            return Err(ConfigError::MalformedBracket {
                jurisdiction: jurisdiction.to_string(),
                index: 0,
                reason: "first bracket must start at zero",
            });
        }

        for (index, bracket) in self.brackets.iter().enumerate() {
            if !bracket.threshold.is_finite() {
                return Err(ConfigError::MalformedBracket {
                    jurisdiction: jurisdiction.to_string(),
                    index,
                    reason: "threshold is not finite",
                });
            }
            check_rate(&format!("{jurisdiction}.brackets[{index}].rate"), bracket.rate)?;
            if index > 0 && bracket.threshold <= self.brackets[index - 1].threshold {
                return Err(ConfigError::MalformedBracket {
                    jurisdiction: jurisdiction.to_string(),
                    index,
                    reason: "thresholds must be strictly ascending",
                });
            }
        }

        check_rate(
            &format!("{jurisdiction}.capital_gains_inclusion"),
            self.capital_gains_inclusion,
        )?;
        check_rate(
            &format!("{jurisdiction}.credits.age_phaseout_rate"),
            self.credits.age_phaseout_rate,
        )?;
        check_rate(&format!("{jurisdiction}.dividend.cred_elig"), self.dividend.cred_elig)?;
        check_rate(
            &format!("{jurisdiction}.dividend.cred_nonelig"),
            self.dividend.cred_nonelig,
        )?;
        check_rate(
            &format!("{jurisdiction}.dividend.gross_up_elig"),
            self.dividend.gross_up_elig,
        )?;
        check_rate(
            &format!("{jurisdiction}.dividend.gross_up_nonelig"),
            self.dividend.gross_up_nonelig,
        )?;
        check_rate(
            &format!("{jurisdiction}.federal_abatement"),
            self.federal_abatement,
        )?;
        if let Some(clawback) = &self.oas_clawback {
            check_rate(&format!("{jurisdiction}.oas_clawback.rate"), clawback.rate)?;
        }

        for (field, value) in [
            ("basic_personal", self.credits.basic_personal),
            ("age_amount", self.credits.age_amount),
            ("age_threshold", self.credits.age_threshold),
            ("pension_amount", self.credits.pension_amount),
            ("disability", self.credits.disability),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRate {
                    field: format!("{jurisdiction}.credits.{field}"),
                    value,
                });
            }
        }

        Ok(())
    }
}

fn check_rate(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate {
            field: field.to_string(),
            value,
        })
    }
}

/// Guaranteed Income Supplement parameters, expressed in `base_year` dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GisParams {
    pub threshold_single: f64,
    pub threshold_couple: f64,
    pub max_benefit_single: f64,
    /// Per recipient when both partners receive OAS
    pub max_benefit_couple: f64,
    pub clawback_rate: f64,
    pub base_year: i32,
}

/// Tax treatment of passive income held inside a private corporation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorporateTaxParams {
    /// Tax on interest and the taxable half of gains earned inside the corporation
    pub passive_rate: f64,
    /// Portion of `passive_rate` added to the refundable pool
    pub refundable_rate: f64,
    /// Refund released per dollar of taxable dividend paid out; also the
    /// refundable tax on portfolio dividends the corporation receives
    pub dividend_refund_rate: f64,
}

impl Default for CorporateTaxParams {
    fn default() -> Self {
        Self {
            passive_rate: 0.4667,
            refundable_rate: 0.3067,
            dividend_refund_rate: 0.3833,
        }
    }
}

/// Complete tax configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    pub federal: JurisdictionParams,
    pub provinces: FxHashMap<Province, JurisdictionParams>,
    pub rrif_minimum: RrifMinimumTable,
    pub gis: GisParams,
    #[serde(default)]
    pub corporate: CorporateTaxParams,
}

impl TaxConfig {
    /// Look up a province block
    pub fn province(&self, province: Province) -> Result<&JurisdictionParams, ConfigError> {
        self.provinces
            .get(&province)
            .ok_or(ConfigError::MissingProvince(province))
    }

    /// Check every table before a simulation starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.federal.validate("federal")?;

        let mut provinces: Vec<_> = self.provinces.iter().collect();
        provinces.sort_by_key(|(p, _)| p.code());
        for (province, params) in provinces {
            params.validate(province.code())?;
        }

        self.rrif_minimum.validate()?;

        check_rate("gis.clawback_rate", self.gis.clawback_rate)?;
        for (field, value) in [
            ("gis.threshold_single", self.gis.threshold_single),
            ("gis.threshold_couple", self.gis.threshold_couple),
            ("gis.max_benefit_single", self.gis.max_benefit_single),
            ("gis.max_benefit_couple", self.gis.max_benefit_couple),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRate {
                    field: field.to_string(),
                    value,
                });
            }
        }

        check_rate("corporate.passive_rate", self.corporate.passive_rate)?;
        check_rate("corporate.refundable_rate", self.corporate.refundable_rate)?;
        check_rate(
            "corporate.dividend_refund_rate",
            self.corporate.dividend_refund_rate,
        )?;

        Ok(())
    }

    /// Federal and provincial tables indexed to the 2025 planning year.
    ///
    /// Federal thresholds: 55,867 / 111,733 / 173,205 / 246,752.
    #[must_use]
    pub fn canada_2025() -> Self {
        let gross_ups = |cred_elig: f64, cred_nonelig: f64| DividendParams {
            gross_up_elig: 0.38,
            cred_elig,
            gross_up_nonelig: 0.15,
            cred_nonelig,
        };

        let federal = JurisdictionParams {
            brackets: brackets(&[
                (0.0, 0.15),
                (55_867.0, 0.205),
                (111_733.0, 0.26),
                (173_205.0, 0.29),
                (246_752.0, 0.33),
            ]),
            credits: Credits {
                basic_personal: 15_705.0,
                age_amount: 8_790.0,
                age_threshold: 44_325.0,
                age_phaseout_rate: 0.15,
                age_credit_min_age: 65,
                pension_amount: 2_000.0,
                pension_credit_min_age: 65,
                disability: 9_872.0,
            },
            dividend: gross_ups(0.150198, 0.090301),
            capital_gains_inclusion: 0.5,
            oas_clawback: Some(OasClawback {
                threshold: 90_997.0,
                rate: 0.15,
            }),
            federal_abatement: 0.0,
        };

        let mut provinces = FxHashMap::default();
        provinces.insert(
            Province::AB,
            JurisdictionParams {
                brackets: brackets(&[
                    (0.0, 0.10),
                    (148_269.0, 0.12),
                    (177_922.0, 0.13),
                    (237_230.0, 0.14),
                    (355_845.0, 0.15),
                ]),
                credits: Credits {
                    basic_personal: 21_885.0,
                    age_amount: 6_221.0,
                    age_threshold: 46_308.0,
                    age_phaseout_rate: 0.15,
                    age_credit_min_age: 65,
                    pension_amount: 1_719.0,
                    pension_credit_min_age: 65,
                    disability: 16_066.0,
                },
                dividend: gross_ups(0.0812, 0.0218),
                capital_gains_inclusion: 0.5,
                oas_clawback: None,
                federal_abatement: 0.0,
            },
        );
        provinces.insert(
            Province::BC,
            JurisdictionParams {
                brackets: brackets(&[
                    (0.0, 0.0506),
                    (47_937.0, 0.077),
                    (95_875.0, 0.105),
                    (110_076.0, 0.1229),
                    (133_664.0, 0.147),
                    (181_232.0, 0.168),
                    (252_752.0, 0.205),
                ]),
                credits: Credits {
                    basic_personal: 12_580.0,
                    age_amount: 5_373.0,
                    age_threshold: 40_000.0,
                    age_phaseout_rate: 0.15,
                    age_credit_min_age: 65,
                    pension_amount: 1_000.0,
                    pension_credit_min_age: 65,
                    disability: 9_699.0,
                },
                dividend: gross_ups(0.12, 0.0196),
                capital_gains_inclusion: 0.5,
                oas_clawback: None,
                federal_abatement: 0.0,
            },
        );
        provinces.insert(
            Province::ON,
            JurisdictionParams {
                brackets: brackets(&[
                    (0.0, 0.0505),
                    (51_446.0, 0.0915),
                    (102_894.0, 0.1116),
                    (150_000.0, 0.1216),
                    (220_000.0, 0.1316),
                ]),
                credits: Credits {
                    basic_personal: 12_399.0,
                    age_amount: 6_223.0,
                    age_threshold: 46_330.0,
                    age_phaseout_rate: 0.15,
                    age_credit_min_age: 65,
                    pension_amount: 1_762.0,
                    pension_credit_min_age: 65,
                    disability: 10_250.0,
                },
                dividend: gross_ups(0.10, 0.029863),
                capital_gains_inclusion: 0.5,
                oas_clawback: None,
                federal_abatement: 0.0,
            },
        );
        provinces.insert(
            Province::QC,
            JurisdictionParams {
                brackets: brackets(&[
                    (0.0, 0.14),
                    (51_780.0, 0.19),
                    (103_545.0, 0.24),
                    (126_000.0, 0.2575),
                ]),
                credits: Credits {
                    basic_personal: 18_056.0,
                    age_amount: 3_798.0,
                    age_threshold: 42_090.0,
                    age_phaseout_rate: 0.1875,
                    age_credit_min_age: 65,
                    pension_amount: 3_374.0,
                    pension_credit_min_age: 65,
                    disability: 3_774.0,
                },
                dividend: gross_ups(0.117, 0.0342),
                capital_gains_inclusion: 0.5,
                oas_clawback: None,
                federal_abatement: 0.165,
            },
        );
        provinces.insert(
            Province::SK,
            JurisdictionParams {
                brackets: brackets(&[(0.0, 0.105), (52_057.0, 0.125), (148_734.0, 0.145)]),
                credits: Credits {
                    basic_personal: 18_491.0,
                    age_amount: 5_380.0,
                    age_threshold: 40_051.0,
                    age_phaseout_rate: 0.15,
                    age_credit_min_age: 65,
                    pension_amount: 1_000.0,
                    pension_credit_min_age: 65,
                    disability: 10_405.0,
                },
                dividend: gross_ups(0.11, 0.02519),
                capital_gains_inclusion: 0.5,
                oas_clawback: None,
                federal_abatement: 0.0,
            },
        );

        TaxConfig {
            federal,
            provinces,
            rrif_minimum: RrifMinimumTable::canada_2025(),
            gis: GisParams {
                threshold_single: 21_768.0,
                threshold_couple: 28_752.0,
                max_benefit_single: 13_265.16,
                max_benefit_couple: 7_985.88,
                clawback_rate: 0.5,
                base_year: 2026,
            },
            corporate: CorporateTaxParams::default(),
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self::canada_2025()
    }
}

fn brackets(entries: &[(f64, f64)]) -> Vec<TaxBracket> {
    entries
        .iter()
        .map(|&(threshold, rate)| TaxBracket { threshold, rate })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_validates() {
        let config = TaxConfig::canada_2025();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.province(Province::AB).is_ok());
    }

    #[test]
    fn test_missing_province() {
        let config = TaxConfig::canada_2025();
        assert_eq!(
            config.province(Province::NU).err(),
            Some(ConfigError::MissingProvince(Province::NU))
        );
    }

    #[test]
    fn test_unsorted_brackets_rejected() {
        let mut config = TaxConfig::canada_2025();
        config.federal.brackets.swap(1, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedBracket { index: 2, .. })
        ));
    }

    #[test]
    fn test_first_bracket_must_start_at_zero() {
        let mut config = TaxConfig::canada_2025();
        config.federal.brackets.remove(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedBracket { index: 0, .. })
        ));
    }

    #[test]
    fn test_nan_rate_rejected() {
        let mut config = TaxConfig::canada_2025();
        if let Some(on) = config.provinces.get_mut(&Province::ON) {
            on.brackets[1].rate = f64::NAN;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_config_json_shape() {
        let json = r#"{
            "federal": {
                "brackets": [{"th": 0, "rate": 0.15}, {"th": 55867, "rate": 0.205}],
                "credits": {"basic_personal": 15705},
                "dividend": {"gross_up_elig": 0.38, "cred_elig": 0.150198,
                             "gross_up_nonelig": 0.15, "cred_nonelig": 0.090301},
                "capital_gains_inclusion": 0.5,
                "oas_clawback": {"threshold": 90997, "rate": 0.15}
            },
            "provinces": {
                "AB": {
                    "brackets": [{"threshold": 0, "rate": 0.10}],
                    "credits": {"basic_personal": 21885},
                    "dividend": {"gross_up_elig": 0.38, "cred_elig": 0.0812,
                                 "gross_up_nonelig": 0.15, "cred_nonelig": 0.0218}
                }
            },
            "rrif_minimum": {"71": 0.0528, "95": 0.20},
            "gis": {"threshold_single": 21768, "threshold_couple": 28752,
                    "max_benefit_single": 13265.16, "max_benefit_couple": 7985.88,
                    "clawback_rate": 0.5, "base_year": 2026}
        }"#;
        let config: TaxConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.federal.brackets[1].threshold, 55_867.0);
        assert_eq!(config.federal.credits.age_credit_min_age, 65);
        assert_eq!(config.rrif_minimum.factor_for_age(71), 0.0528);
        assert!(config.province(Province::AB).is_ok());
        assert_eq!(config.corporate, CorporateTaxParams::default());
    }
}
