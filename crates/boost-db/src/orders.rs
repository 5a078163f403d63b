use eyre::WrapErr;
use sqlx::{QueryBuilder, Sqlite, Transaction};

use models::{
    NewOrder, Order, OrderChanges, OrderRow, OrderStatus, OrderType, TimelineEntry, TimelineRow,
};

use crate::SqlitePool;

const ORDER_COLUMNS: &str = "id, client_id, booster_id, status, order_type, \
     current_rating, desired_rating, wins_required, placement_matches, options, price_amount, \
     account_login, account_password, steam_offline_mode, \
     current_progress_rating, current_progress_wins, current_progress_matches, \
     feedback_rating, feedback_comment, feedback_given_at, created_at, last_updated";

/// Scope and paging for an order listing. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub client_id: Option<i64>,
    pub booster_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub page: i64,
    pub limit: i64,
}

/// Listing of pending, unassigned orders for boosters to pick from.
#[derive(Debug, Clone, Default)]
pub struct AvailableOrderFilter {
    pub order_type: Option<OrderType>,
    pub min_elo: i64,
    pub max_elo: Option<i64>,
    pub page: i64,
    pub limit: i64,
}

fn offset(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit)
}

/// Insert a pending order together with its first timeline entry.
pub async fn insert_order(pool: &SqlitePool, order: &NewOrder, now: i64) -> eyre::Result<Order> {
    let options = serde_json::to_string(&order.options).wrap_err("serialize order options")?;
    let mut tx = pool.begin().await.wrap_err("begin transaction")?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders (
           client_id, status, order_type,
           current_rating, desired_rating, wins_required, placement_matches,
           options, price_amount,
           account_login, account_password, steam_offline_mode,
           created_at, last_updated
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order.client_id)
    .bind(OrderStatus::Pending.as_str())
    .bind(order.order_type.as_str())
    .bind(order.current_rating)
    .bind(order.desired_rating)
    .bind(order.wins_required)
    .bind(order.placement_matches)
    .bind(&options)
    .bind(order.price_amount)
    .bind(order.account_login.as_deref())
    .bind(order.account_password.as_deref())
    .bind(order.steam_offline_mode)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .wrap_err("insert order")?;

    insert_timeline(&mut tx, row.id, OrderStatus::Pending, "Order created", now).await?;
    tx.commit().await.wrap_err("commit transaction")?;

    Order::try_from(row)
}

pub async fn get_order(pool: &SqlitePool, id: i64) -> eyre::Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .wrap_err("get order")?;

    row.map(Order::try_from).transpose()
}

fn push_order_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(client_id) = filter.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(booster_id) = filter.booster_id {
        builder.push(" AND booster_id = ").push_bind(booster_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

/// One page of orders, newest first, and the total number matching `filter`.
pub async fn list_orders(pool: &SqlitePool, filter: &OrderFilter) -> eyre::Result<(Vec<Order>, i64)> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_order_filter(&mut builder, filter);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(offset(filter.page, filter.limit));

    let rows = builder
        .build_query_as::<OrderRow>()
        .fetch_all(pool)
        .await
        .wrap_err("list orders")?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
    push_order_filter(&mut count, filter);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .wrap_err("count orders")?;

    let orders = rows
        .into_iter()
        .map(Order::try_from)
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok((orders, total))
}

fn push_available_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &AvailableOrderFilter) {
    builder
        .push(" WHERE booster_id IS NULL AND status = ")
        .push_bind(OrderStatus::Pending.as_str());

    if let Some(order_type) = filter.order_type {
        builder
            .push(" AND order_type = ")
            .push_bind(order_type.as_str());
    }

    // rating bounds only mean something for elo orders
    if matches!(filter.order_type, None | Some(OrderType::EloBoosting)) {
        builder
            .push(" AND (order_type != ")
            .push_bind(OrderType::EloBoosting.as_str())
            .push(" OR (current_rating >= ")
            .push_bind(filter.min_elo);
        if let Some(max_elo) = filter.max_elo {
            builder.push(" AND desired_rating <= ").push_bind(max_elo);
        }
        builder.push("))");
    }
}

pub async fn list_available_orders(
    pool: &SqlitePool,
    filter: &AvailableOrderFilter,
) -> eyre::Result<(Vec<Order>, i64)> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_available_filter(&mut builder, filter);
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(offset(filter.page, filter.limit));

    let rows = builder
        .build_query_as::<OrderRow>()
        .fetch_all(pool)
        .await
        .wrap_err("list available orders")?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
    push_available_filter(&mut count, filter);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .wrap_err("count available orders")?;

    let orders = rows
        .into_iter()
        .map(Order::try_from)
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok((orders, total))
}

/// Write `changes` and bump `last_updated`. When the status moves away from
/// `previous_status` a timeline entry is appended with `note`, or a generic
/// one.
///
/// A status change only lands while the row still holds `previous_status`.
/// Returns `None` when the order is gone or its status moved in between.
pub async fn update_order(
    pool: &SqlitePool,
    id: i64,
    changes: &OrderChanges,
    previous_status: OrderStatus,
    note: Option<&str>,
    now: i64,
) -> eyre::Result<Option<Order>> {
    let options = changes
        .options
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .wrap_err("serialize order options")?;

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET last_updated = ");
    builder.push_bind(now);

    if let Some(status) = changes.status {
        builder.push(", status = ").push_bind(status.as_str());
    }
    if let Some(booster_id) = changes.booster_id {
        builder.push(", booster_id = ").push_bind(booster_id);
    }
    if let Some(order_type) = changes.order_type {
        builder.push(", order_type = ").push_bind(order_type.as_str());
    }
    if let Some(value) = changes.current_rating {
        builder.push(", current_rating = ").push_bind(value);
    }
    if let Some(value) = changes.desired_rating {
        builder.push(", desired_rating = ").push_bind(value);
    }
    if let Some(value) = changes.wins_required {
        builder.push(", wins_required = ").push_bind(value);
    }
    if let Some(value) = changes.placement_matches {
        builder.push(", placement_matches = ").push_bind(value);
    }
    if let Some(options) = options {
        builder.push(", options = ").push_bind(options);
    }
    if let Some(value) = changes.price_amount {
        builder.push(", price_amount = ").push_bind(value);
    }
    if let Some(login) = &changes.account_login {
        builder.push(", account_login = ").push_bind(login.clone());
    }
    if let Some(password) = &changes.account_password {
        builder.push(", account_password = ").push_bind(password.clone());
    }
    if let Some(value) = changes.steam_offline_mode {
        builder.push(", steam_offline_mode = ").push_bind(value);
    }
    if let Some(value) = changes.current_progress_rating {
        builder.push(", current_progress_rating = ").push_bind(value);
    }
    if let Some(value) = changes.current_progress_wins {
        builder.push(", current_progress_wins = ").push_bind(value);
    }
    if let Some(value) = changes.current_progress_matches {
        builder.push(", current_progress_matches = ").push_bind(value);
    }

    builder.push(" WHERE id = ").push_bind(id);
    if changes.status.is_some() {
        builder
            .push(" AND status = ")
            .push_bind(previous_status.as_str());
    }
    builder.push(format!(" RETURNING {ORDER_COLUMNS}"));

    let mut tx = pool.begin().await.wrap_err("begin transaction")?;

    let Some(row) = builder
        .build_query_as::<OrderRow>()
        .fetch_optional(&mut *tx)
        .await
        .wrap_err("update order")?
    else {
        return Ok(None);
    };

    if let Some(status) = changes.status.filter(|status| *status != previous_status) {
        let default_note = format!("Status changed to {status}");
        insert_timeline(&mut tx, id, status, note.unwrap_or(&default_note), now).await?;
    }

    tx.commit().await.wrap_err("commit transaction")?;
    Order::try_from(row).map(Some)
}

/// Assign `booster_id` to a pending, unassigned order. Returns `None` when
/// the order is gone or somebody else got there first.
pub async fn accept_order(
    pool: &SqlitePool,
    id: i64,
    booster_id: i64,
    now: i64,
) -> eyre::Result<Option<Order>> {
    let mut tx = pool.begin().await.wrap_err("begin transaction")?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders
         SET booster_id = ?1, status = ?2, last_updated = ?3
         WHERE id = ?4 AND status = ?5 AND booster_id IS NULL
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(booster_id)
    .bind(OrderStatus::InProgress.as_str())
    .bind(now)
    .bind(id)
    .bind(OrderStatus::Pending.as_str())
    .fetch_optional(&mut *tx)
    .await
    .wrap_err("accept order")?;

    let Some(row) = row else {
        return Ok(None);
    };

    insert_timeline(
        &mut tx,
        id,
        OrderStatus::InProgress,
        "Order accepted by booster",
        now,
    )
    .await?;
    tx.commit().await.wrap_err("commit transaction")?;

    Order::try_from(row).map(Some)
}

/// Store client feedback and refresh the assigned booster's rating.
pub async fn record_feedback(
    pool: &SqlitePool,
    id: i64,
    rating: i64,
    comment: Option<&str>,
    now: i64,
) -> eyre::Result<Option<Order>> {
    let mut tx = pool.begin().await.wrap_err("begin transaction")?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders
         SET feedback_rating = ?1, feedback_comment = ?2, feedback_given_at = ?3, last_updated = ?3
         WHERE id = ?4
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(rating)
    .bind(comment)
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .wrap_err("record feedback")?;

    let Some(row) = row else {
        return Ok(None);
    };

    if let Some(booster_id) = row.booster_id {
        crate::users::refresh_booster_stats(&mut tx, booster_id).await?;
    }

    tx.commit().await.wrap_err("commit transaction")?;
    Order::try_from(row).map(Some)
}

pub async fn list_timeline(pool: &SqlitePool, order_id: i64) -> eyre::Result<Vec<TimelineEntry>> {
    let rows = sqlx::query_as::<_, TimelineRow>(
        "SELECT id, order_id, status, note, created_at
         FROM order_timeline
         WHERE order_id = ?
         ORDER BY created_at ASC, id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .wrap_err("list order timeline")?;

    rows.into_iter().map(TimelineEntry::try_from).collect()
}

async fn insert_timeline(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: i64,
    status: OrderStatus,
    note: &str,
    now: i64,
) -> eyre::Result<()> {
    sqlx::query(
        "INSERT INTO order_timeline (order_id, status, note, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(order_id)
    .bind(status.as_str())
    .bind(note)
    .bind(now)
    .execute(&mut **tx)
    .await
    .wrap_err("insert order timeline")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_treats_page_as_one_based() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(3, 10), 20);
        assert_eq!(offset(0, 10), 0);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        assert_eq!(offset(i64::MAX, 100), i64::MAX);
    }

    #[test]
    fn available_filter_bounds_only_elo_orders() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        push_available_filter(
            &mut builder,
            &AvailableOrderFilter {
                order_type: None,
                min_elo: 1000,
                max_elo: Some(2000),
                page: 1,
                limit: 10,
            },
        );
        let sql = builder.sql();
        assert!(sql.contains("booster_id IS NULL"));
        assert!(sql.contains("order_type != "));
        assert!(sql.contains("desired_rating <= "));

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        push_available_filter(
            &mut builder,
            &AvailableOrderFilter {
                order_type: Some(OrderType::WinsBoost),
                min_elo: 1000,
                max_elo: None,
                page: 1,
                limit: 10,
            },
        );
        assert!(!builder.sql().contains("current_rating"));
    }
}
