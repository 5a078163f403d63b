use std::collections::BTreeSet;
use std::str::FromStr;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub mod order;

pub use order::{
    Message, MessageRow, MessageSender, NewOrder, Order, OrderChanges, OrderRow, Page,
    TimelineEntry, TimelineRow,
};

/// Add-on a client can enable on a boost.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OptionFlag {
    LobbyDuo,
    SoloOnly,
    SteamOfflineMode,
    PremiumQueue,
    Priority,
    SuperExpress,
    LiveStream,
}

impl OptionFlag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LobbyDuo => "lobbyDuo",
            Self::SoloOnly => "soloOnly",
            Self::SteamOfflineMode => "steamOfflineMode",
            Self::PremiumQueue => "premiumQueue",
            Self::Priority => "priority",
            Self::SuperExpress => "superExpress",
            Self::LiveStream => "liveStream",
        }
    }
}

/// Immutable set of enabled add-ons.
///
/// Serialized as a JSON array of flag names. The textual form accepted by
/// [`FromStr`] is a comma separated list (`"priority,liveStream"`); blank
/// entries are skipped so an empty string is the empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoostOptions(BTreeSet<OptionFlag>);

impl BoostOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        OptionFlag::iter().collect()
    }

    pub fn with(mut self, flag: OptionFlag) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn contains(&self, flag: OptionFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = OptionFlag> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<OptionFlag> for BoostOptions {
    fn from_iter<I: IntoIterator<Item = OptionFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for BoostOptions {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                OptionFlag::from_str(part).wrap_err_with(|| format!("unknown option: {part}"))
            })
            .collect()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Client,
    Booster,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Booster => "booster",
            Self::Admin => "admin",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Dispute,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Dispute => "dispute",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OrderType {
    EloBoosting,
    WinsBoost,
    PlacementMatches,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EloBoosting => "eloBoosting",
            Self::WinsBoost => "winsBoost",
            Self::PlacementMatches => "placementMatches",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub booster_rating: Option<f64>,
    pub booster_completed_orders: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub booster_rating: Option<f64>,
    pub booster_completed_orders: i64,
    pub created_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = eyre::Report;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .wrap_err_with(|| format!("invalid role '{}' for user {}", row.role, row.id))?;
        Ok(Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            booster_rating: row.booster_rating,
            booster_completed_orders: row.booster_completed_orders,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_flags_use_camel_case_names() {
        assert_eq!(OptionFlag::SteamOfflineMode.to_string(), "steamOfflineMode");
        assert_eq!(
            OptionFlag::from_str("superExpress").unwrap(),
            OptionFlag::SuperExpress
        );
        for flag in OptionFlag::iter() {
            assert_eq!(flag.to_string(), flag.as_str());
        }
        let json = serde_json::to_string(&OptionFlag::LobbyDuo).unwrap();
        assert_eq!(json, "\"lobbyDuo\"");
    }

    #[test]
    fn boost_options_parse_comma_list() {
        let options: BoostOptions = " priority, liveStream ,,".parse().unwrap();
        assert_eq!(options.len(), 2);
        assert!(options.contains(OptionFlag::Priority));
        assert!(options.contains(OptionFlag::LiveStream));

        assert!(BoostOptions::from_str("").unwrap().is_empty());
        assert!(BoostOptions::from_str("priority,turbo").is_err());
    }

    #[test]
    fn boost_options_serialize_as_array() {
        let options = BoostOptions::new()
            .with(OptionFlag::SuperExpress)
            .with(OptionFlag::LobbyDuo);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"["lobbyDuo","superExpress"]"#);

        let back: BoostOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
        assert_eq!(BoostOptions::all().len(), 7);
    }

    #[test]
    fn status_strings_match_stored_values() {
        assert_eq!(OrderStatus::InProgress.to_string(), "inProgress");
        assert_eq!(
            OrderStatus::from_str("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
        for status in OrderStatus::iter() {
            assert_eq!(status.to_string(), status.as_str());
        }
        for order_type in OrderType::iter() {
            assert_eq!(order_type.to_string(), order_type.as_str());
        }
        for role in Role::iter() {
            assert_eq!(role.to_string(), role.as_str());
        }
    }

    #[test]
    fn user_row_with_unknown_role_is_rejected() {
        let row = UserRow {
            id: 7,
            email: "x@example.com".to_string(),
            name: "x".to_string(),
            role: "superuser".to_string(),
            booster_rating: None,
            booster_completed_orders: 0,
            created_at: 0,
        };
        assert!(User::try_from(row).is_err());
    }
}
