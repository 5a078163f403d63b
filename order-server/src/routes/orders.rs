use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use boost_db::{AvailableOrderFilter, OrderFilter};
use boost_pricing::{BoostRequest, Estimator};
use models::{
    BoostOptions, NewOrder, Order, OrderStatus, OrderType, Page, Role, TimelineEntry, User,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::{AppError, Result},
    policy::{can_access, plan_update, UpdateOrderRequest},
    routes::paging,
    state::AppState,
};

/// `max_elo` at or above this means "no upper bound".
const UNBOUNDED_ELO: i64 = 100_000;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableOrdersQuery {
    order_type: Option<String>,
    min_elo: Option<i64>,
    max_elo: Option<i64>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    order_type: OrderType,
    current_rating: Option<i64>,
    desired_rating: Option<i64>,
    wins_required: Option<i64>,
    placement_matches: Option<i64>,
    #[serde(default)]
    options: BoostOptions,
    price_amount: Option<i64>,
    account_login: Option<String>,
    account_password: Option<String>,
    #[serde(default)]
    steam_offline_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    rating: i64,
    comment: Option<String>,
}

/// `None` and `"all"` mean no filter.
fn parse_filter<T: FromStr>(raw: Option<&str>, field: &str) -> Result<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => T::from_str(value)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("unknown {field} '{value}'"))),
    }
}

async fn load_order(state: &AppState, user: &User, id: i64) -> Result<Order> {
    let order = boost_db::get_order(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    if !can_access(user, &order) {
        return Err(AppError::Forbidden(format!(
            "no access to order {id}"
        )));
    }
    Ok(order)
}

fn positive(value: Option<i64>, field: &str) -> Result<i64> {
    value
        .filter(|value| *value > 0)
        .ok_or_else(|| AppError::BadRequest(format!("{field} must be a positive number")))
}

/// Validate a create request for `order_type`. Elo boosts are priced here;
/// any price the client sent for them is ignored.
fn new_order(
    client_id: i64,
    request: CreateOrderRequest,
    estimator: &(dyn Estimator + Send + Sync),
) -> Result<NewOrder> {
    let mut order = NewOrder {
        client_id,
        order_type: request.order_type,
        current_rating: None,
        desired_rating: None,
        wins_required: None,
        placement_matches: None,
        options: request.options,
        price_amount: 0,
        account_login: request.account_login,
        account_password: request.account_password,
        steam_offline_mode: request.steam_offline_mode,
    };

    match request.order_type {
        OrderType::EloBoosting => {
            let (Some(current), Some(desired)) = (request.current_rating, request.desired_rating)
            else {
                return Err(AppError::BadRequest(
                    "eloBoosting orders need current_rating and desired_rating".to_string(),
                ));
            };
            let quote =
                estimator.quote(&BoostRequest::new(current, desired, order.options.clone()))?;
            order.current_rating = Some(current);
            order.desired_rating = Some(desired);
            order.price_amount = i64::try_from(quote.final_price)
                .map_err(|_| AppError::BadRequest("price out of range".to_string()))?;
        }
        OrderType::WinsBoost => {
            order.wins_required = Some(positive(request.wins_required, "wins_required")?);
            order.price_amount = positive(request.price_amount, "price_amount")?;
        }
        OrderType::PlacementMatches => {
            order.placement_matches =
                Some(positive(request.placement_matches, "placement_matches")?);
            order.price_amount = positive(request.price_amount, "price_amount")?;
        }
    }

    Ok(order)
}

pub async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    query: std::result::Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Page<Order>>> {
    let Query(params) = query?;
    let (page, limit) = paging(params.page, params.limit);

    let mut filter = OrderFilter {
        status: parse_filter::<OrderStatus>(params.status.as_deref(), "status")?,
        page,
        limit,
        ..Default::default()
    };
    match user.role {
        Role::Client => filter.client_id = Some(user.id),
        Role::Booster => filter.booster_id = Some(user.id),
        Role::Admin => {}
    }

    let (orders, total) = boost_db::list_orders(&state.db_pool, &filter).await?;
    Ok(Json(Page::new(orders, total, page, limit)))
}

pub async fn create_order(
    State(state): State<AppState>,
    current: CurrentUser,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>)> {
    current.require_role(Role::Client, "create orders")?;
    let Json(request) = body?;

    let new = new_order(current.0.id, request, state.estimator.as_ref())?;
    let order = boost_db::insert_order(&state.db_pool, &new, state.now()).await?;

    tracing::info!(
        order_id = order.id,
        client_id = order.client_id,
        order_type = %order.order_type,
        price = order.price_amount,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn available_orders(
    State(state): State<AppState>,
    current: CurrentUser,
    query: std::result::Result<Query<AvailableOrdersQuery>, QueryRejection>,
) -> Result<Json<Page<Order>>> {
    current.require_role(Role::Booster, "browse available orders")?;
    let Query(params) = query?;
    let (page, limit) = paging(params.page, params.limit);

    let filter = AvailableOrderFilter {
        order_type: parse_filter::<OrderType>(params.order_type.as_deref(), "order_type")?,
        min_elo: params.min_elo.unwrap_or(0),
        max_elo: params.max_elo.filter(|max| *max < UNBOUNDED_ELO),
        page,
        limit,
    };

    let (orders, total) = boost_db::list_available_orders(&state.db_pool, &filter).await?;
    Ok(Json(Page::new(orders, total, page, limit)))
}

pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    load_order(&state, &user, id).await.map(Json)
}

pub async fn update_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    body: std::result::Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(request) = body?;
    let order = load_order(&state, &user, id).await?;

    let changes = plan_update(user.role, order.status, &request).map_err(AppError::BadRequest)?;

    let updated = boost_db::update_order(
        &state.db_pool,
        id,
        &changes,
        order.status,
        request.note.as_deref(),
        state.now(),
    )
    .await?;
    let Some(updated) = updated else {
        return Err(match boost_db::get_order(&state.db_pool, id).await? {
            Some(_) => AppError::Conflict(format!(
                "order {id} changed status, reload and retry"
            )),
            None => AppError::NotFound(format!("order {id} not found")),
        });
    };

    if updated.status != order.status {
        tracing::info!(
            order_id = id,
            user_id = user.id,
            "order status {} -> {}",
            order.status,
            updated.status
        );
    }
    Ok(Json(updated))
}

pub async fn accept_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    current.require_role(Role::Booster, "accept orders")?;
    let booster = &current.0;

    let order = boost_db::get_order(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    if order.status != OrderStatus::Pending || order.booster_id.is_some() {
        return Err(AppError::Conflict(format!(
            "order {id} is not available for accepting"
        )));
    }

    let accepted = boost_db::accept_order(&state.db_pool, id, booster.id, state.now())
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("order {id} was accepted by another booster"))
        })?;

    tracing::info!(order_id = id, booster_id = booster.id, "order accepted");
    Ok(Json(accepted))
}

pub async fn add_feedback(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    body: std::result::Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    current.require_role(Role::Client, "leave feedback")?;
    let Json(request) = body?;

    if !(1..=5).contains(&request.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let order = boost_db::get_order(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    if order.client_id != current.0.id {
        return Err(AppError::Forbidden(format!(
            "order {id} belongs to another client"
        )));
    }
    if order.status != OrderStatus::Completed {
        return Err(AppError::BadRequest(
            "only completed orders can be rated".to_string(),
        ));
    }

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|comment| !comment.is_empty());
    let rated = boost_db::record_feedback(&state.db_pool, id, request.rating, comment, state.now())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(rated))
}

pub async fn timeline(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TimelineEntry>>> {
    let order = load_order(&state, &user, id).await?;
    let entries = boost_db::list_timeline(&state.db_pool, order.id).await?;
    Ok(Json(entries))
}
