//! Price and duration estimates for rating boosts.
//!
//! A climb from a start rating to a target rating is billed per block of
//! rating points at the rate of the tier the block starts in. Add-ons add a
//! percentage of that base price, a flat discount and a loyalty cashback
//! follow, and the gap is turned into an estimated completion time.

mod config;
mod duration;
mod policy;
mod tiers;

use serde::{Deserialize, Serialize};

pub use config::{PricingConfig, DEFAULT_BLOCKS_PER_HOUR, DEFAULT_BLOCK_SIZE, DEFAULT_SURCHARGES};
pub use duration::{estimate_duration, DurationEstimate, DurationUnit, Pace};
pub use models::{BoostOptions, OptionFlag};
pub use policy::{apply_pricing_policy, PolicyOutcome};
pub use tiers::{compute_base_price, Cents, TierRow, TierTable, DEFAULT_TIERS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("target rating {target} is below start rating {start}")]
    InvalidRange { start: i64, target: i64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid tier table: {0}")]
    InvalidTierTable(String),
    #[error("invalid pricing config: {0}")]
    InvalidConfig(String),
}

/// One pricing question: how much to go from `start_rating` to `target_rating`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostRequest {
    pub start_rating: i64,
    pub target_rating: i64,
    #[serde(default)]
    pub options: BoostOptions,
}

impl BoostRequest {
    pub fn new(start_rating: i64, target_rating: i64, options: BoostOptions) -> Self {
        Self {
            start_rating,
            target_rating,
            options,
        }
    }

    fn validated(&self) -> Result<(u32, u32), PricingError> {
        let start = to_rating(self.start_rating, "start_rating")?;
        let target = to_rating(self.target_rating, "target_rating")?;
        if target < start {
            return Err(PricingError::InvalidRange {
                start: self.start_rating,
                target: self.target_rating,
            });
        }
        Ok((start, target))
    }
}

fn to_rating(value: i64, field: &str) -> Result<u32, PricingError> {
    u32::try_from(value).map_err(|_| {
        PricingError::InvalidInput(format!(
            "{field} must be between 0 and {}, got {value}",
            u32::MAX
        ))
    })
}

/// Parse a rating supplied as text (query string, CLI). Missing and
/// non-numeric values are input errors.
pub fn parse_rating(raw: Option<&str>, field: &str) -> Result<i64, PricingError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PricingError::InvalidInput(format!("missing {field}")))?;
    raw.parse::<i64>()
        .map_err(|_| PricingError::InvalidInput(format!("{field} must be an integer, got '{raw}'")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub start_rating: u32,
    pub target_rating: u32,
    pub start_level: u32,
    pub target_level: u32,
    pub options: BoostOptions,
    pub base_price: Cents,
    pub surcharge_percent: u32,
    pub total_with_fees: f64,
    /// `total_with_fees` rounded, shown next to the discounted price.
    pub original_price: u64,
    pub final_price: u64,
    pub cashback: u64,
    pub secondary_currency_price: u64,
    pub estimated_duration: DurationEstimate,
}

pub trait Estimator {
    fn quote(&self, request: &BoostRequest) -> Result<PriceQuote, PricingError>;
}

/// Stateless estimator over a validated [`PricingConfig`].
#[derive(Debug, Clone, Default)]
pub struct PriceEstimator {
    config: PricingConfig,
}

impl PriceEstimator {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }
}

impl Estimator for PriceEstimator {
    fn quote(&self, request: &BoostRequest) -> Result<PriceQuote, PricingError> {
        let (start, target) = request.validated()?;
        let config = &self.config;

        let base_price = compute_base_price(start, target, &config.tiers, config.block_size)?;
        let outcome = apply_pricing_policy(base_price, &request.options, config)?;
        let estimated_duration = estimate_duration(start, target, &request.options, config);

        Ok(PriceQuote {
            start_rating: start,
            target_rating: target,
            start_level: config.tiers.level_for(start),
            target_level: config.tiers.level_for(target),
            options: request.options.clone(),
            base_price,
            surcharge_percent: outcome.surcharge_percent,
            total_with_fees: outcome.total_with_fees,
            original_price: outcome.original_price,
            final_price: outcome.final_price,
            cashback: outcome.cashback,
            secondary_currency_price: outcome.secondary_currency_price,
            estimated_duration,
        })
    }
}

/// Quote with the built-in tier table and rates.
pub fn quote(
    start_rating: i64,
    target_rating: i64,
    options: &BoostOptions,
) -> Result<PriceQuote, PricingError> {
    PriceEstimator::default().quote(&BoostRequest::new(
        start_rating,
        target_rating,
        options.clone(),
    ))
}
