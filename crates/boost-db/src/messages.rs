use eyre::WrapErr;

use models::{Message, MessageRow, Role};

use crate::SqlitePool;

const MESSAGE_SELECT: &str = "SELECT m.id, m.order_id, m.content, m.read, m.created_at,
            u.id AS sender_id, u.name AS sender_name, u.role AS sender_role
     FROM messages m
     JOIN users u ON u.id = m.sender_id";

/// Messages on an order, oldest first, with their sender.
pub async fn list_messages(pool: &SqlitePool, order_id: i64) -> eyre::Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        "{MESSAGE_SELECT}
         WHERE m.order_id = ?
         ORDER BY m.created_at ASC, m.id ASC"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await
    .wrap_err("list messages")?;

    rows.into_iter().map(Message::try_from).collect()
}

pub async fn get_message(pool: &SqlitePool, id: i64) -> eyre::Result<Option<Message>> {
    let row = sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .wrap_err("get message")?;

    row.map(Message::try_from).transpose()
}

pub async fn insert_message(
    pool: &SqlitePool,
    order_id: i64,
    sender_id: i64,
    content: &str,
    now: i64,
) -> eyre::Result<Message> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO messages (order_id, sender_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
    )
    .bind(order_id)
    .bind(sender_id)
    .bind(content)
    .bind(now)
    .fetch_one(pool)
    .await
    .wrap_err("insert message")?;

    get_message(pool, id)
        .await?
        .ok_or_else(|| eyre::eyre!("message {id} vanished after insert"))
}

/// Mark everything on `order_id` that `reader_id` did not send as read.
/// Returns how many messages changed.
pub async fn mark_order_messages_read(
    pool: &SqlitePool,
    order_id: i64,
    reader_id: i64,
) -> eyre::Result<u64> {
    let result = sqlx::query(
        "UPDATE messages SET read = 1 WHERE order_id = ?1 AND sender_id != ?2 AND read = 0",
    )
    .bind(order_id)
    .bind(reader_id)
    .execute(pool)
    .await
    .wrap_err("mark order messages read")?;

    Ok(result.rows_affected())
}

pub async fn mark_message_read(pool: &SqlitePool, id: i64) -> eyre::Result<bool> {
    let result = sqlx::query("UPDATE messages SET read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .wrap_err("mark message read")?;

    Ok(result.rows_affected() > 0)
}

/// Unread messages sent by someone else on orders the user takes part in.
/// Admins see every order.
pub async fn unread_count(pool: &SqlitePool, user_id: i64, role: Role) -> eyre::Result<i64> {
    let scope = match role {
        Role::Client => "AND o.client_id = ?2",
        Role::Booster => "AND o.booster_id = ?2",
        Role::Admin => "AND ?2 = ?2",
    };

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*)
         FROM messages m
         JOIN orders o ON o.id = m.order_id
         WHERE m.read = 0 AND m.sender_id != ?1 {scope}"
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .wrap_err("count unread messages")?;

    Ok(count)
}
