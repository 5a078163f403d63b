use std::str::FromStr;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::{BoostOptions, OrderStatus, OrderType, Role};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub client_id: i64,
    pub booster_id: Option<i64>,
    pub status: String,
    pub order_type: String,
    pub current_rating: Option<i64>,
    pub desired_rating: Option<i64>,
    pub wins_required: Option<i64>,
    pub placement_matches: Option<i64>,
    pub options: String,
    pub price_amount: i64,
    pub account_login: Option<String>,
    pub account_password: Option<String>,
    pub steam_offline_mode: bool,
    pub current_progress_rating: Option<i64>,
    pub current_progress_wins: Option<i64>,
    pub current_progress_matches: Option<i64>,
    pub feedback_rating: Option<i64>,
    pub feedback_comment: Option<String>,
    pub feedback_given_at: Option<i64>,
    pub created_at: i64,
    pub last_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub booster_id: Option<i64>,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub current_rating: Option<i64>,
    pub desired_rating: Option<i64>,
    pub wins_required: Option<i64>,
    pub placement_matches: Option<i64>,
    pub options: BoostOptions,
    pub price_amount: i64,
    pub account_login: Option<String>,
    pub account_password: Option<String>,
    pub steam_offline_mode: bool,
    pub current_progress_rating: Option<i64>,
    pub current_progress_wins: Option<i64>,
    pub current_progress_matches: Option<i64>,
    pub feedback_rating: Option<i64>,
    pub feedback_comment: Option<String>,
    pub feedback_given_at: Option<i64>,
    pub created_at: i64,
    pub last_updated: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = eyre::Report;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .wrap_err_with(|| format!("invalid status '{}' on order {}", row.status, row.id))?;
        let order_type = OrderType::from_str(&row.order_type).wrap_err_with(|| {
            format!("invalid order_type '{}' on order {}", row.order_type, row.id)
        })?;
        let options: BoostOptions = serde_json::from_str(&row.options)
            .wrap_err_with(|| format!("invalid options on order {}", row.id))?;

        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            booster_id: row.booster_id,
            status,
            order_type,
            current_rating: row.current_rating,
            desired_rating: row.desired_rating,
            wins_required: row.wins_required,
            placement_matches: row.placement_matches,
            options,
            price_amount: row.price_amount,
            account_login: row.account_login,
            account_password: row.account_password,
            steam_offline_mode: row.steam_offline_mode,
            current_progress_rating: row.current_progress_rating,
            current_progress_wins: row.current_progress_wins,
            current_progress_matches: row.current_progress_matches,
            feedback_rating: row.feedback_rating,
            feedback_comment: row.feedback_comment,
            feedback_given_at: row.feedback_given_at,
            created_at: row.created_at,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_id: i64,
    pub order_type: OrderType,
    pub current_rating: Option<i64>,
    pub desired_rating: Option<i64>,
    pub wins_required: Option<i64>,
    pub placement_matches: Option<i64>,
    pub options: BoostOptions,
    pub price_amount: i64,
    pub account_login: Option<String>,
    pub account_password: Option<String>,
    pub steam_offline_mode: bool,
}

/// Column values to write on an existing order. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
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

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimelineRow {
    pub id: i64,
    pub order_id: i64,
    pub status: String,
    pub note: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: i64,
}

impl TryFrom<TimelineRow> for TimelineEntry {
    type Error = eyre::Report;

    fn try_from(row: TimelineRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status).wrap_err_with(|| {
            format!("invalid status '{}' on timeline entry {}", row.status, row.id)
        })?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            status,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub order_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub sender_role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSender {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub order_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: i64,
    pub sender: MessageSender,
}

impl TryFrom<MessageRow> for Message {
    type Error = eyre::Report;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.sender_role).wrap_err_with(|| {
            format!("invalid sender role '{}' on message {}", row.sender_role, row.id)
        })?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            content: row.content,
            read: row.read,
            created_at: row.created_at,
            sender: MessageSender {
                id: row.sender_id,
                name: row.sender_name,
                role,
            },
        })
    }
}

/// One page of a listing plus the numbers a pager needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            count: data.len(),
            data,
            total,
            total_pages,
            current_page: page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptionFlag;

    fn row() -> OrderRow {
        OrderRow {
            id: 1,
            client_id: 10,
            booster_id: None,
            status: "pending".to_string(),
            order_type: "eloBoosting".to_string(),
            current_rating: Some(1200),
            desired_rating: Some(1500),
            wins_required: None,
            placement_matches: None,
            options: r#"["priority"]"#.to_string(),
            price_amount: 88,
            account_login: None,
            account_password: None,
            steam_offline_mode: false,
            current_progress_rating: None,
            current_progress_wins: None,
            current_progress_matches: None,
            feedback_rating: None,
            feedback_comment: None,
            feedback_given_at: None,
            created_at: 100,
            last_updated: 100,
        }
    }

    #[test]
    fn order_row_converts_to_typed_order() {
        let order = Order::try_from(row()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, OrderType::EloBoosting);
        assert!(order.options.contains(OptionFlag::Priority));
        assert_eq!(order.client_id, 10);
        assert_eq!(order.booster_id, None);
    }

    #[test]
    fn order_row_with_bad_status_fails() {
        let mut bad = row();
        bad.status = "shipped".to_string();
        assert!(Order::try_from(bad).is_err());
    }

    #[test]
    fn page_rounds_total_pages_up() {
        let page = Page::new(vec![1, 2, 3], 21, 2, 10);
        assert_eq!(page.count, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);

        let empty: Page<i32> = Page::new(Vec::new(), 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(OrderChanges::default().is_empty());
        let changes = OrderChanges {
            current_progress_wins: Some(3),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
