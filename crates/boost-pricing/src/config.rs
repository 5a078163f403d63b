use std::collections::BTreeMap;
use std::path::Path;

use eyre::WrapErr;
use models::OptionFlag;
use serde::{Deserialize, Serialize};

use crate::tiers::TierTable;
use crate::PricingError;

pub const DEFAULT_BLOCK_SIZE: u32 = 25;
pub const DEFAULT_BLOCKS_PER_HOUR: u32 = 6;

/// Surcharge per add-on, in percent of the base price.
pub const DEFAULT_SURCHARGES: &[(OptionFlag, u32)] = &[
    (OptionFlag::LobbyDuo, 10),
    (OptionFlag::SoloOnly, 15),
    (OptionFlag::SteamOfflineMode, 5),
    (OptionFlag::PremiumQueue, 20),
    (OptionFlag::Priority, 25),
    (OptionFlag::SuperExpress, 30),
    (OptionFlag::LiveStream, 15),
];

/// Every knob of the estimator. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Rating points per billed block (one match).
    pub block_size: u32,
    /// Blocks a booster completes per hour.
    pub blocks_per_hour: u32,
    pub tiers: TierTable,
    pub surcharges: BTreeMap<OptionFlag, u32>,
    pub discount_percent: u32,
    pub cashback_percent: u32,
    /// Fixed multiplier from the final price to the secondary currency.
    pub secondary_currency_rate: u32,
    pub priority_time_percent: u32,
    pub super_express_time_percent: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            blocks_per_hour: DEFAULT_BLOCKS_PER_HOUR,
            tiers: TierTable::default(),
            surcharges: DEFAULT_SURCHARGES.iter().copied().collect(),
            discount_percent: 5,
            cashback_percent: 1,
            secondary_currency_rate: 4,
            priority_time_percent: 80,
            super_express_time_percent: 60,
        }
    }
}

impl PricingConfig {
    /// Flags absent from the schedule carry no surcharge.
    pub fn surcharge_percent(&self, flag: OptionFlag) -> u32 {
        self.surcharges.get(&flag).copied().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        if self.block_size == 0 {
            return Err(PricingError::InvalidConfig(
                "block_size must be positive".to_string(),
            ));
        }
        if self.blocks_per_hour == 0 {
            return Err(PricingError::InvalidConfig(
                "blocks_per_hour must be positive".to_string(),
            ));
        }
        if self.block_size.checked_mul(self.blocks_per_hour).is_none() {
            return Err(PricingError::InvalidConfig(format!(
                "block_size {} times blocks_per_hour {} is too large",
                self.block_size, self.blocks_per_hour
            )));
        }
        for (name, percent) in [
            ("discount_percent", self.discount_percent),
            ("cashback_percent", self.cashback_percent),
            ("priority_time_percent", self.priority_time_percent),
            ("super_express_time_percent", self.super_express_time_percent),
        ] {
            if percent > 100 {
                return Err(PricingError::InvalidConfig(format!(
                    "{name} must be at most 100, got {percent}"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(json).wrap_err("parse pricing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> eyre::Result<Self> {
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read pricing config {}", path.display()))?;
        Self::from_json(&json).wrap_err_with(|| format!("load pricing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::Cents;
    use std::io::Write;

    #[test]
    fn default_schedule_covers_every_flag() {
        let config = PricingConfig::default();
        assert_eq!(config.surcharge_percent(OptionFlag::LobbyDuo), 10);
        assert_eq!(config.surcharge_percent(OptionFlag::SoloOnly), 15);
        assert_eq!(config.surcharge_percent(OptionFlag::SteamOfflineMode), 5);
        assert_eq!(config.surcharge_percent(OptionFlag::PremiumQueue), 20);
        assert_eq!(config.surcharge_percent(OptionFlag::Priority), 25);
        assert_eq!(config.surcharge_percent(OptionFlag::SuperExpress), 30);
        assert_eq!(config.surcharge_percent(OptionFlag::LiveStream), 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PricingConfig::from_json(r#"{"secondary_currency_rate": 5}"#).unwrap();
        assert_eq!(config.secondary_currency_rate, 5);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.tiers, TierTable::default());
    }

    #[test]
    fn json_round_trip_preserves_table() {
        let json = serde_json::to_string(&PricingConfig::default()).unwrap();
        assert!(json.contains(r#""lobbyDuo":10"#));
        let back = PricingConfig::from_json(&json).unwrap();
        assert_eq!(back, PricingConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(PricingConfig::from_json(r#"{"block_size": 0}"#).is_err());
        assert!(PricingConfig::from_json(r#"{"discount_percent": 150}"#).is_err());
        assert!(PricingConfig::from_json(r#"{"tiers": []}"#).is_err());
        assert!(PricingConfig::from_json(r#"{"surcharges": {"turbo": 5}}"#).is_err());
        assert!(PricingConfig::from_json(r#"{"priority_time_percent": 101}"#).is_err());
        assert!(
            PricingConfig::from_json(r#"{"block_size": 65536, "blocks_per_hour": 65536}"#)
                .is_err()
        );
        assert!(PricingConfig::from_json(
            r#"{"tiers": [{"rating_ceiling": 1000, "price_per_block": 1e20}]}"#
        )
        .is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tiers": [{{"rating_ceiling": 1000, "price_per_block": 2.5}}]}}"#
        )
        .unwrap();

        let config = PricingConfig::from_path(file.path()).unwrap();
        assert_eq!(config.tiers.rows().len(), 1);
        assert_eq!(config.tiers.rows()[0].price_per_block, Cents(250));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PricingConfig::from_path(&dir.path().join("nope.json")).is_err());
    }
}
