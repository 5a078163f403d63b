use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{Message, Order, User};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::{AppError, Result},
    policy::can_access,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    content: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    count: i64,
}

async fn accessible_order(state: &AppState, user: &User, order_id: i64) -> Result<Order> {
    let order = boost_db::get_order(&state.db_pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    if !can_access(user, &order) {
        return Err(AppError::Forbidden(format!("no access to order {order_id}")));
    }
    Ok(order)
}

/// Messages on the order, oldest first. Reading them marks everything the
/// caller did not send as read.
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
) -> Result<Json<Vec<Message>>> {
    accessible_order(&state, &user, order_id).await?;

    let marked = boost_db::mark_order_messages_read(&state.db_pool, order_id, user.id).await?;
    if marked > 0 {
        tracing::debug!(order_id, user_id = user.id, marked, "marked messages read");
    }

    let messages = boost_db::list_messages(&state.db_pool, order_id).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<i64>,
    body: std::result::Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>)> {
    let Json(request) = body?;
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("message content is required".to_string()));
    }

    accessible_order(&state, &user, order_id).await?;

    let message =
        boost_db::insert_message(&state.db_pool, order_id, user.id, content, state.now()).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<i64>,
) -> Result<Json<Message>> {
    let message = boost_db::get_message(&state.db_pool, message_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message {message_id} not found")))?;
    accessible_order(&state, &user, message.order_id).await?;

    boost_db::mark_message_read(&state.db_pool, message_id).await?;
    Ok(Json(Message {
        read: true,
        ..message
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCount>> {
    let count = boost_db::unread_count(&state.db_pool, user.id, user.role).await?;
    Ok(Json(UnreadCount { count }))
}
