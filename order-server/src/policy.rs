//! Who may change what on an order.

use models::{BoostOptions, Order, OrderChanges, OrderStatus, OrderType, Role, User};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    BoosterId,
    OrderType,
    CurrentRating,
    DesiredRating,
    WinsRequired,
    PlacementMatches,
    Options,
    PriceAmount,
    AccountLogin,
    AccountPassword,
    SteamOfflineMode,
    CurrentProgressRating,
    CurrentProgressWins,
    CurrentProgressMatches,
}

const CLIENT_FIELDS: &[OrderField] = &[
    OrderField::AccountLogin,
    OrderField::AccountPassword,
    OrderField::SteamOfflineMode,
];

const BOOSTER_FIELDS: &[OrderField] = &[
    OrderField::CurrentProgressRating,
    OrderField::CurrentProgressWins,
    OrderField::CurrentProgressMatches,
];

const ADMIN_FIELDS: &[OrderField] = &[
    OrderField::BoosterId,
    OrderField::OrderType,
    OrderField::CurrentRating,
    OrderField::DesiredRating,
    OrderField::WinsRequired,
    OrderField::PlacementMatches,
    OrderField::Options,
    OrderField::PriceAmount,
    OrderField::AccountLogin,
    OrderField::AccountPassword,
    OrderField::SteamOfflineMode,
    OrderField::CurrentProgressRating,
    OrderField::CurrentProgressWins,
    OrderField::CurrentProgressMatches,
];

/// Fields a role may write through `PUT /api/orders/{id}`. Status is
/// governed separately by [`status_transition`].
pub fn allowed_fields(role: Role) -> &'static [OrderField] {
    match role {
        Role::Client => CLIENT_FIELDS,
        Role::Booster => BOOSTER_FIELDS,
        Role::Admin => ADMIN_FIELDS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDecision {
    Apply(OrderStatus),
    Ignore,
    Reject(String),
}

pub fn status_transition(role: Role, current: OrderStatus, requested: OrderStatus) -> StatusDecision {
    use OrderStatus::*;

    match role {
        Role::Admin if requested == current => StatusDecision::Ignore,
        Role::Admin => StatusDecision::Apply(requested),
        Role::Client => match (current, requested) {
            (Pending, Cancelled) => StatusDecision::Apply(Cancelled),
            _ => StatusDecision::Ignore,
        },
        Role::Booster => match (current, requested) {
            (Pending, InProgress) | (InProgress, Completed) => StatusDecision::Apply(requested),
            _ => StatusDecision::Reject(format!(
                "boosters cannot move an order from {current} to {requested}"
            )),
        },
    }
}

/// Clients see their own orders, boosters the ones assigned to them,
/// admins everything.
pub fn can_access(user: &User, order: &Order) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Client => order.client_id == user.id,
        Role::Booster => order.booster_id == Some(user.id),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
    pub booster_id: Option<i64>,
    pub order_type: Option<OrderType>,
    pub current_rating: Option<i64>,
    pub desired_rating: Option<i64>,
    pub wins_required: Option<i64>,
    pub placement_matches: Option<i64>,
    pub options: Option<BoostOptions>,
    pub price_amount: Option<i64>,
    pub account_login: Option<String>,
    pub account_password: Option<String>,
    pub steam_offline_mode: Option<bool>,
    pub current_progress_rating: Option<i64>,
    pub current_progress_wins: Option<i64>,
    pub current_progress_matches: Option<i64>,
}

/// Turn a request into the column writes `role` is entitled to. Fields
/// outside the role's whitelist are dropped silently; a status the role may
/// not set is either dropped or rejected per [`status_transition`].
pub fn plan_update(
    role: Role,
    current: OrderStatus,
    request: &UpdateOrderRequest,
) -> Result<OrderChanges, String> {
    let allowed = allowed_fields(role);
    let keep = |field: OrderField| allowed.contains(&field);

    let status = match request.status {
        Some(requested) => match status_transition(role, current, requested) {
            StatusDecision::Apply(status) => Some(status),
            StatusDecision::Ignore => None,
            StatusDecision::Reject(reason) => return Err(reason),
        },
        None => None,
    };

    Ok(OrderChanges {
        status,
        booster_id: request.booster_id.filter(|_| keep(OrderField::BoosterId)),
        order_type: request.order_type.filter(|_| keep(OrderField::OrderType)),
        current_rating: request
            .current_rating
            .filter(|_| keep(OrderField::CurrentRating)),
        desired_rating: request
            .desired_rating
            .filter(|_| keep(OrderField::DesiredRating)),
        wins_required: request.wins_required.filter(|_| keep(OrderField::WinsRequired)),
        placement_matches: request
            .placement_matches
            .filter(|_| keep(OrderField::PlacementMatches)),
        options: request.options.clone().filter(|_| keep(OrderField::Options)),
        price_amount: request.price_amount.filter(|_| keep(OrderField::PriceAmount)),
        account_login: request
            .account_login
            .clone()
            .filter(|_| keep(OrderField::AccountLogin)),
        account_password: request
            .account_password
            .clone()
            .filter(|_| keep(OrderField::AccountPassword)),
        steam_offline_mode: request
            .steam_offline_mode
            .filter(|_| keep(OrderField::SteamOfflineMode)),
        current_progress_rating: request
            .current_progress_rating
            .filter(|_| keep(OrderField::CurrentProgressRating)),
        current_progress_wins: request
            .current_progress_wins
            .filter(|_| keep(OrderField::CurrentProgressWins)),
        current_progress_matches: request
            .current_progress_matches
            .filter(|_| keep(OrderField::CurrentProgressMatches)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn everything() -> UpdateOrderRequest {
        UpdateOrderRequest {
            status: None,
            note: None,
            booster_id: Some(9),
            order_type: Some(OrderType::WinsBoost),
            current_rating: Some(1000),
            desired_rating: Some(1200),
            wins_required: Some(3),
            placement_matches: Some(5),
            options: Some(BoostOptions::all()),
            price_amount: Some(1),
            account_login: Some("login".into()),
            account_password: Some("hunter2".into()),
            steam_offline_mode: Some(true),
            current_progress_rating: Some(1100),
            current_progress_wins: Some(1),
            current_progress_matches: Some(2),
        }
    }

    #[test]
    fn client_may_only_touch_account_fields() {
        let changes = plan_update(Role::Client, Pending, &everything()).unwrap();
        assert_eq!(
            changes,
            OrderChanges {
                account_login: Some("login".into()),
                account_password: Some("hunter2".into()),
                steam_offline_mode: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn booster_may_only_touch_progress_fields() {
        let changes = plan_update(Role::Booster, InProgress, &everything()).unwrap();
        assert_eq!(
            changes,
            OrderChanges {
                current_progress_rating: Some(1100),
                current_progress_wins: Some(1),
                current_progress_matches: Some(2),
                ..Default::default()
            }
        );
    }

    #[test]
    fn admin_may_touch_everything() {
        let request = UpdateOrderRequest {
            status: Some(Dispute),
            ..everything()
        };
        let changes = plan_update(Role::Admin, Completed, &request).unwrap();
        assert_eq!(changes.status, Some(Dispute));
        assert_eq!(changes.booster_id, Some(9));
        assert_eq!(changes.price_amount, Some(1));
        assert_eq!(changes.options, Some(BoostOptions::all()));
    }

    #[test]
    fn client_cancel_only_from_pending() {
        assert_eq!(
            status_transition(Role::Client, Pending, Cancelled),
            StatusDecision::Apply(Cancelled)
        );
        assert_eq!(
            status_transition(Role::Client, InProgress, Cancelled),
            StatusDecision::Ignore
        );
        assert_eq!(
            status_transition(Role::Client, Pending, Completed),
            StatusDecision::Ignore
        );
    }

    #[test]
    fn booster_follows_the_happy_path_or_is_rejected() {
        assert_eq!(
            status_transition(Role::Booster, Pending, InProgress),
            StatusDecision::Apply(InProgress)
        );
        assert_eq!(
            status_transition(Role::Booster, InProgress, Completed),
            StatusDecision::Apply(Completed)
        );
        assert!(matches!(
            status_transition(Role::Booster, Pending, Completed),
            StatusDecision::Reject(_)
        ));
        assert!(matches!(
            status_transition(Role::Booster, InProgress, Cancelled),
            StatusDecision::Reject(_)
        ));

        let request = UpdateOrderRequest {
            status: Some(Dispute),
            ..Default::default()
        };
        assert!(plan_update(Role::Booster, InProgress, &request).is_err());
    }

    #[test]
    fn same_status_is_ignored_except_for_boosters() {
        assert_eq!(
            status_transition(Role::Admin, Dispute, Dispute),
            StatusDecision::Ignore
        );
        assert_eq!(
            status_transition(Role::Client, Pending, Pending),
            StatusDecision::Ignore
        );
        assert!(matches!(
            status_transition(Role::Booster, InProgress, InProgress),
            StatusDecision::Reject(_)
        ));
        assert!(matches!(
            status_transition(Role::Booster, Pending, Pending),
            StatusDecision::Reject(_)
        ));
    }
}
