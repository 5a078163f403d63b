use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PricingError;

/// Money in hundredths of the currency unit.
///
/// Serialized as a plain decimal number (`4.08`); decimals finer than a cent
/// are rounded half away from zero when parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn from_decimal(value: f64) -> Result<Self, PricingError> {
        if !value.is_finite() || value < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "amount must be a non-negative number, got {value}"
            )));
        }
        let cents = (value * 100.0).round();
        if cents >= u64::MAX as f64 {
            return Err(PricingError::InvalidInput(format!(
                "amount {value} is too large"
            )));
        }
        Ok(Self(cents as u64))
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Cents::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRow {
    pub rating_ceiling: u32,
    pub price_per_block: Cents,
}

/// Rating ceiling and price per block for the built-in table, ascending.
pub const DEFAULT_TIERS: &[(u32, u64)] = &[
    (800, 408),
    (950, 432),
    (1100, 568),
    (1250, 644),
    (1400, 728),
    (1550, 904),
    (1700, 880),
    (1850, 1164),
    (2000, 1596),
    (2500, 1284),
];

/// Non-empty tier rows with strictly increasing ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierRow>", into = "Vec<TierRow>")]
pub struct TierTable {
    rows: Vec<TierRow>,
}

impl TierTable {
    pub fn new(rows: Vec<TierRow>) -> Result<Self, PricingError> {
        if rows.is_empty() {
            return Err(PricingError::InvalidTierTable(
                "at least one row is required".to_string(),
            ));
        }

        for pair in rows.windows(2) {
            if pair[1].rating_ceiling <= pair[0].rating_ceiling {
                return Err(PricingError::InvalidTierTable(format!(
                    "ceilings must be strictly increasing ({} follows {})",
                    pair[1].rating_ceiling, pair[0].rating_ceiling
                )));
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[TierRow] {
        &self.rows
    }

    /// First row whose ceiling lies above `position`.
    pub fn tier_for(&self, position: u32) -> Option<&TierRow> {
        self.rows.iter().find(|row| position < row.rating_ceiling)
    }

    pub fn last(&self) -> &TierRow {
        // rows is never empty, see `new`
        &self.rows[self.rows.len() - 1]
    }

    /// 1-based rank badge for a rating: the index of its tier, or the row
    /// count once past the top ceiling.
    pub fn level_for(&self, rating: u32) -> u32 {
        self.rows
            .iter()
            .position(|row| rating < row.rating_ceiling)
            .map_or(self.rows.len(), |idx| idx + 1) as u32
    }

    pub(crate) fn base_price(
        &self,
        start: u32,
        target: u32,
        block_size: u32,
    ) -> Result<Cents, PricingError> {
        let block_size = u64::from(block_size);
        let target = u64::from(target);
        let mut position = u64::from(start);
        let mut total = 0u64;

        while position < target {
            let Some(tier) = self.tier_for(position as u32) else {
                let blocks = (target - position).div_ceil(block_size);
                total = add_blocks(total, blocks, self.last().price_per_block)?;
                break;
            };

            let segment_end = u64::from(tier.rating_ceiling).min(target);
            let blocks = (segment_end - position).div_ceil(block_size);
            total = add_blocks(total, blocks, tier.price_per_block)?;
            // the rounded-up overshoot is paid for but never crosses the tier boundary
            position = position
                .saturating_add(blocks * block_size)
                .min(segment_end);
        }

        Ok(Cents(total))
    }
}

fn add_blocks(total: u64, blocks: u64, price: Cents) -> Result<u64, PricingError> {
    blocks
        .checked_mul(price.0)
        .and_then(|cost| total.checked_add(cost))
        .ok_or_else(|| {
            PricingError::InvalidConfig(format!(
                "base price overflows at {blocks} blocks of {price}"
            ))
        })
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            rows: DEFAULT_TIERS
                .iter()
                .map(|&(rating_ceiling, cents)| TierRow {
                    rating_ceiling,
                    price_per_block: Cents(cents),
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<TierRow>> for TierTable {
    type Error = PricingError;

    fn try_from(rows: Vec<TierRow>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<TierTable> for Vec<TierRow> {
    fn from(table: TierTable) -> Self {
        table.rows
    }
}

/// Price of moving from `start_rating` to `target_rating`, billed per
/// started block of `block_size` points at the rate of the tier each block
/// starts in.
pub fn compute_base_price(
    start_rating: u32,
    target_rating: u32,
    table: &TierTable,
    block_size: u32,
) -> Result<Cents, PricingError> {
    if block_size == 0 {
        return Err(PricingError::InvalidConfig(
            "block size must be positive".to_string(),
        ));
    }
    if target_rating < start_rating {
        return Err(PricingError::InvalidRange {
            start: i64::from(start_rating),
            target: i64::from(target_rating),
        });
    }
    table.base_price(start_rating, target_rating, block_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(start: u32, target: u32) -> Cents {
        compute_base_price(start, target, &TierTable::default(), 25).unwrap()
    }

    #[test]
    fn equal_ratings_cost_nothing() {
        assert_eq!(price(1500, 1500), Cents::ZERO);
        assert_eq!(price(0, 0), Cents::ZERO);
    }

    #[test]
    fn walks_across_tier_boundaries() {
        // 2 x 6.44 + 6 x 7.28 + 4 x 9.04
        assert_eq!(price(1200, 1500), Cents(9272));
        assert_eq!(price(1200, 1500).to_string(), "92.72");
    }

    #[test]
    fn single_tier_from_zero() {
        assert_eq!(price(0, 800), Cents(32 * 408));
    }

    #[test]
    fn partial_blocks_are_billed_whole_without_crossing_the_boundary() {
        // 10 points at 6.44, then 10 points at 7.28
        assert_eq!(price(1240, 1260), Cents(644 + 728));
        assert_eq!(price(1200, 1201), Cents(644));
    }

    #[test]
    fn ratings_above_the_table_use_the_last_price() {
        // 4 blocks up to 2500, then 4 more at the fallback rate
        assert_eq!(price(2400, 2600), Cents(8 * 1284));
        assert_eq!(price(2600, 2610), Cents(1284));
        assert_eq!(price(3000, 4000), Cents(40 * 1284));
    }

    #[test]
    fn base_price_never_decreases_with_target() {
        for start in [0u32, 790, 1234, 2480] {
            let mut previous = Cents::ZERO;
            for target in (start..start + 2000).step_by(7) {
                let current = price(start, target);
                assert!(
                    current >= previous,
                    "price dropped from {previous} to {current} at {start}->{target}"
                );
                previous = current;
            }
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = compute_base_price(1500, 1200, &TierTable::default(), 25).unwrap_err();
        assert_eq!(
            err,
            PricingError::InvalidRange {
                start: 1500,
                target: 1200
            }
        );
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(compute_base_price(0, 100, &TierTable::default(), 0).is_err());
    }

    #[test]
    fn level_matches_rank_badges() {
        let table = TierTable::default();
        assert_eq!(table.level_for(0), 1);
        assert_eq!(table.level_for(799), 1);
        assert_eq!(table.level_for(800), 2);
        assert_eq!(table.level_for(1999), 9);
        assert_eq!(table.level_for(2000), 10);
        assert_eq!(table.level_for(2600), 10);
    }

    #[test]
    fn table_rows_must_increase() {
        let rows = vec![
            TierRow {
                rating_ceiling: 900,
                price_per_block: Cents(100),
            },
            TierRow {
                rating_ceiling: 900,
                price_per_block: Cents(200),
            },
        ];
        assert!(matches!(
            TierTable::new(rows),
            Err(PricingError::InvalidTierTable(_))
        ));
        assert!(TierTable::new(Vec::new()).is_err());
    }

    #[test]
    fn table_deserializes_from_decimal_prices() {
        let json = r#"[{"rating_ceiling": 1000, "price_per_block": 4.08},
                       {"rating_ceiling": 2000, "price_per_block": 11.6449}]"#;
        let table: TierTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rows()[0].price_per_block, Cents(408));
        assert_eq!(table.rows()[1].price_per_block, Cents(1164));

        let unordered = r#"[{"rating_ceiling": 2000, "price_per_block": 1.0},
                            {"rating_ceiling": 1000, "price_per_block": 1.0}]"#;
        assert!(serde_json::from_str::<TierTable>(unordered).is_err());
        let negative = r#"[{"rating_ceiling": 1000, "price_per_block": -1.0}]"#;
        assert!(serde_json::from_str::<TierTable>(negative).is_err());
        let huge = r#"[{"rating_ceiling": 1000, "price_per_block": 1e20}]"#;
        assert!(serde_json::from_str::<TierTable>(huge).is_err());
    }

    #[test]
    fn base_price_overflow_is_an_error() {
        let table = TierTable::new(vec![TierRow {
            rating_ceiling: 1000,
            price_per_block: Cents(u64::MAX / 2),
        }])
        .unwrap();
        assert_eq!(
            compute_base_price(0, 25, &table, 25),
            Ok(Cents(u64::MAX / 2))
        );
        assert!(matches!(
            compute_base_price(0, 75, &table, 25),
            Err(PricingError::InvalidConfig(_))
        ));
        assert!(matches!(
            compute_base_price(0, u32::MAX, &table, 1),
            Err(PricingError::InvalidConfig(_))
        ));
    }
}
