//! Statutory payroll rate tables.
//!
//! Every rate, threshold and fee the net-pay calculation uses lives here as
//! plain data, so a new tax year is a new `PayrollSchedule` value rather than
//! a code change. All tiers and bands are closed on the lower bound and open
//! on the upper bound: a salary exactly at a threshold falls in the higher tier.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::types::{Money, Rate};
use crate::CalcResult;

/// Monthly ceiling on tax-deductible voluntary pension contributions
const VOLUNTARY_PENSION_CAP: Money = dec!(30000);

/// One marginal income-tax band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBand {
    pub lower_bound: Money,
    /// `None` for the top band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Money>,
    pub rate: Rate,
}

/// Statutory pension contribution, as a rate on capped pensionable pay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionRule {
    pub rate: Rate,
    /// Pensionable pay up to this amount is reported as tier one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_one_limit: Option<Money>,
    /// Pay above this amount is not pensionable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_earnings_limit: Option<Money>,
    /// Ceiling on the contribution itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PensionContribution {
    pub tier_one: Money,
    pub tier_two: Money,
    pub total: Money,
}

/// A step in a tiered flat-fee table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevyTier {
    pub lower_bound: Money,
    pub fee: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthLevyRule {
    /// Flat fee chosen by gross salary range
    Tiered { tiers: Vec<LevyTier> },
    /// Percentage of gross with a floor
    Percentage { rate: Rate, minimum: Money },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingLevyRule {
    pub rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<Money>,
}

/// Complete set of monthly statutory deduction rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollSchedule {
    pub name: String,
    pub pension: PensionRule,
    pub tax_bands: Vec<TaxBand>,
    pub personal_relief: Money,
    pub health_levy: HealthLevyRule,
    pub housing_levy: HousingLevyRule,
    /// Most voluntary pension contribution deductible from taxable income;
    /// uncapped when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voluntary_pension_cap: Option<Money>,
}

impl Default for PayrollSchedule {
    fn default() -> Self {
        PayrollSchedule::kenya_2025()
    }
}

impl PayrollSchedule {
    /// Kenyan monthly rates with the flat NSSF cap and the tiered NHIF table.
    pub fn kenya_2025() -> Self {
        let nhif = [
            (dec!(0), dec!(150)),
            (dec!(6000), dec!(300)),
            (dec!(8000), dec!(400)),
            (dec!(12000), dec!(500)),
            (dec!(15000), dec!(600)),
            (dec!(20000), dec!(750)),
            (dec!(25000), dec!(850)),
            (dec!(30000), dec!(900)),
            (dec!(35000), dec!(950)),
            (dec!(40000), dec!(1000)),
            (dec!(45000), dec!(1100)),
            (dec!(50000), dec!(1200)),
            (dec!(60000), dec!(1300)),
            (dec!(70000), dec!(1400)),
            (dec!(80000), dec!(1500)),
            (dec!(90000), dec!(1600)),
            (dec!(100000), dec!(1700)),
        ];

        PayrollSchedule {
            name: "kenya-2025".into(),
            pension: PensionRule {
                rate: dec!(0.06),
                tier_one_limit: None,
                upper_earnings_limit: None,
                cap: Some(dec!(2160)),
            },
            tax_bands: bands(&[
                (dec!(0), dec!(0.10)),
                (dec!(24000), dec!(0.25)),
                (dec!(32333), dec!(0.30)),
                (dec!(500000), dec!(0.35)),
            ]),
            personal_relief: dec!(2400),
            health_levy: HealthLevyRule::Tiered {
                tiers: nhif
                    .iter()
                    .map(|&(lower_bound, fee)| LevyTier { lower_bound, fee })
                    .collect(),
            },
            housing_levy: HousingLevyRule {
                rate: dec!(0.015),
                cap: None,
            },
            voluntary_pension_cap: Some(VOLUNTARY_PENSION_CAP),
        }
    }

    /// Kenyan monthly rates after the SHIF changeover: tiered NSSF, a fifth tax
    /// band, percentage health levy and a capped housing levy.
    pub fn kenya_shif_2025() -> Self {
        PayrollSchedule {
            name: "kenya-shif-2025".into(),
            pension: PensionRule {
                rate: dec!(0.06),
                tier_one_limit: Some(dec!(8000)),
                upper_earnings_limit: Some(dec!(72000)),
                cap: None,
            },
            tax_bands: bands(&[
                (dec!(0), dec!(0.10)),
                (dec!(24000), dec!(0.25)),
                (dec!(32333), dec!(0.30)),
                (dec!(500000), dec!(0.325)),
                (dec!(800000), dec!(0.35)),
            ]),
            personal_relief: dec!(2400),
            health_levy: HealthLevyRule::Percentage {
                rate: dec!(0.0275),
                minimum: dec!(300),
            },
            housing_levy: HousingLevyRule {
                rate: dec!(0.015),
                cap: Some(dec!(5000)),
            },
            voluntary_pension_cap: Some(VOLUNTARY_PENSION_CAP),
        }
    }

    /// Look up a built-in schedule by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "kenya-2025" => Some(PayrollSchedule::kenya_2025()),
            "kenya-shif-2025" => Some(PayrollSchedule::kenya_shif_2025()),
            _ => None,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.pension.validate()?;
        validate_tax_bands(&self.tax_bands)?;
        if self.personal_relief < Decimal::ZERO {
            return Err(CalcError::InvalidInput {
                field: "personal_relief".into(),
                reason: "Personal relief cannot be negative".into(),
            });
        }
        self.health_levy.validate()?;
        self.housing_levy.validate()?;
        check_optional_amount("voluntary_pension_cap", self.voluntary_pension_cap)
    }

    /// The part of a voluntary pension contribution the schedule allows.
    pub fn allowed_voluntary_pension(&self, contribution: Money) -> Money {
        match self.voluntary_pension_cap {
            Some(cap) => contribution.min(cap),
            None => contribution,
        }
    }
}

impl PensionRule {
    pub fn contribution(&self, gross: Money) -> PensionContribution {
        let pensionable = match self.upper_earnings_limit {
            Some(limit) => gross.min(limit),
            None => gross,
        };
        let mut total = pensionable * self.rate;
        if let Some(cap) = self.cap {
            total = total.min(cap);
        }
        let tier_one = match self.tier_one_limit {
            Some(limit) => (pensionable.min(limit) * self.rate).min(total),
            None => total,
        };
        PensionContribution {
            tier_one,
            tier_two: total - tier_one,
            total,
        }
    }

    fn validate(&self) -> CalcResult<()> {
        check_rate("pension.rate", self.rate)?;
        check_optional_amount("pension.tier_one_limit", self.tier_one_limit)?;
        check_optional_amount("pension.upper_earnings_limit", self.upper_earnings_limit)?;
        check_optional_amount("pension.cap", self.cap)
    }
}

impl HealthLevyRule {
    pub fn fee(&self, gross: Money) -> Money {
        match self {
            HealthLevyRule::Tiered { tiers } => tiers
                .iter()
                .rev()
                .find(|t| gross >= t.lower_bound)
                .map(|t| t.fee)
                .unwrap_or(Decimal::ZERO),
            HealthLevyRule::Percentage { rate, minimum } => (gross * rate).max(*minimum),
        }
    }

    fn validate(&self) -> CalcResult<()> {
        match self {
            HealthLevyRule::Tiered { tiers } => {
                let first = tiers.first().ok_or_else(|| CalcError::InvalidInput {
                    field: "health_levy.tiers".into(),
                    reason: "At least one tier is required".into(),
                })?;
                if !first.lower_bound.is_zero() {
                    return Err(CalcError::InvalidInput {
                        field: "health_levy.tiers".into(),
                        reason: "The first tier must start at 0".into(),
                    });
                }
                if first.fee < Decimal::ZERO {
                    return Err(CalcError::InvalidInput {
                        field: "health_levy.tiers".into(),
                        reason: "Fees cannot be negative".into(),
                    });
                }
                for pair in tiers.windows(2) {
                    if pair[1].lower_bound <= pair[0].lower_bound {
                        return Err(CalcError::InvalidInput {
                            field: "health_levy.tiers".into(),
                            reason: format!(
                                "Tier lower bounds must ascend ({} follows {})",
                                pair[1].lower_bound, pair[0].lower_bound
                            ),
                        });
                    }
                    if pair[1].fee < pair[0].fee {
                        return Err(CalcError::InvalidInput {
                            field: "health_levy.tiers".into(),
                            reason: format!(
                                "Fees must not decrease as salary rises (tier at {})",
                                pair[1].lower_bound
                            ),
                        });
                    }
                }
                Ok(())
            }
            HealthLevyRule::Percentage { rate, minimum } => {
                check_rate("health_levy.rate", *rate)?;
                check_optional_amount("health_levy.minimum", Some(*minimum))
            }
        }
    }
}

impl HousingLevyRule {
    pub fn levy(&self, gross: Money) -> Money {
        let levy = gross * self.rate;
        match self.cap {
            Some(cap) => levy.min(cap),
            None => levy,
        }
    }

    fn validate(&self) -> CalcResult<()> {
        check_rate("housing_levy.rate", self.rate)?;
        check_optional_amount("housing_levy.cap", self.cap)
    }
}

/// Build contiguous bands from (lower bound, rate) pairs; the last is unbounded.
fn bands(steps: &[(Money, Rate)]) -> Vec<TaxBand> {
    steps
        .iter()
        .enumerate()
        .map(|(i, &(lower_bound, rate))| TaxBand {
            lower_bound,
            upper_bound: steps.get(i + 1).map(|next| next.0),
            rate,
        })
        .collect()
}

fn validate_tax_bands(tax_bands: &[TaxBand]) -> CalcResult<()> {
    let first = tax_bands.first().ok_or_else(|| CalcError::InvalidInput {
        field: "tax_bands".into(),
        reason: "At least one tax band is required".into(),
    })?;
    if !first.lower_bound.is_zero() {
        return Err(CalcError::InvalidInput {
            field: "tax_bands".into(),
            reason: "The first band must start at 0".into(),
        });
    }

    let last = tax_bands.len() - 1;
    for (i, band) in tax_bands.iter().enumerate() {
        check_rate("tax_bands.rate", band.rate)?;
        match (band.upper_bound, i == last) {
            (Some(upper), false) => {
                if upper <= band.lower_bound {
                    return Err(CalcError::InvalidInput {
                        field: "tax_bands".into(),
                        reason: format!("Band starting at {} has an empty range", band.lower_bound),
                    });
                }
                if tax_bands[i + 1].lower_bound != upper {
                    return Err(CalcError::InvalidInput {
                        field: "tax_bands".into(),
                        reason: format!(
                            "Bands must be contiguous: {} does not start where the previous band ends ({})",
                            tax_bands[i + 1].lower_bound, upper
                        ),
                    });
                }
            }
            (None, false) => {
                return Err(CalcError::InvalidInput {
                    field: "tax_bands".into(),
                    reason: "Only the top band may be unbounded".into(),
                });
            }
            (Some(_), true) => {
                return Err(CalcError::InvalidInput {
                    field: "tax_bands".into(),
                    reason: "The top band must be unbounded".into(),
                });
            }
            (None, true) => {}
        }
    }
    Ok(())
}

fn check_rate(field: &str, rate: Rate) -> CalcResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(CalcError::InvalidInput {
            field: field.into(),
            reason: format!("Rate {rate} must be between 0 and 1"),
        });
    }
    Ok(())
}

fn check_optional_amount(field: &str, amount: Option<Money>) -> CalcResult<()> {
    match amount {
        Some(a) if a < Decimal::ZERO => Err(CalcError::InvalidInput {
            field: field.into(),
            reason: "Amount cannot be negative".into(),
        }),
        _ => Ok(()),
    }
}
