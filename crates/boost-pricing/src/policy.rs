use models::BoostOptions;
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::tiers::Cents;
use crate::PricingError;

/// Totals derived from a base price once add-ons, discount and cashback apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    pub surcharge_percent: u32,
    pub total_with_fees: f64,
    pub original_price: u64,
    pub final_price: u64,
    pub cashback: u64,
    pub secondary_currency_price: u64,
}

// base (1/100) times percent (1/100)
const TOTAL_SCALE: u128 = 10_000;
// total scale times one more percent factor
const RATE_SCALE: u128 = 1_000_000;

/// Every surcharge is a percentage of `base`, summed without compounding.
/// Each rounded field is rounded once, half away from zero, from the exact
/// unrounded total.
pub fn apply_pricing_policy(
    base: Cents,
    options: &BoostOptions,
    config: &PricingConfig,
) -> Result<PolicyOutcome, PricingError> {
    let surcharge_percent = options
        .iter()
        .try_fold(0u32, |sum, flag| sum.checked_add(config.surcharge_percent(flag)))
        .ok_or_else(|| overflow("surcharge sum"))?;

    let scaled_total = u128::from(base.0) * (100 + u128::from(surcharge_percent));
    let discounted = scaled_total * u128::from(100 - config.discount_percent.min(100));
    let cashback = scaled_total
        .checked_mul(u128::from(config.cashback_percent))
        .ok_or_else(|| overflow("cashback"))?;
    let secondary = discounted
        .checked_mul(u128::from(config.secondary_currency_rate))
        .ok_or_else(|| overflow("secondary currency price"))?;

    Ok(PolicyOutcome {
        surcharge_percent,
        total_with_fees: scaled_total as f64 / TOTAL_SCALE as f64,
        original_price: round_div(scaled_total, TOTAL_SCALE, "original price")?,
        final_price: round_div(discounted, RATE_SCALE, "final price")?,
        cashback: round_div(cashback, RATE_SCALE, "cashback")?,
        secondary_currency_price: round_div(secondary, RATE_SCALE, "secondary currency price")?,
    })
}

fn round_div(numerator: u128, denominator: u128, what: &str) -> Result<u64, PricingError> {
    u64::try_from((numerator + denominator / 2) / denominator).map_err(|_| overflow(what))
}

fn overflow(what: &str) -> PricingError {
    PricingError::InvalidConfig(format!("{what} overflows"))
}
