mod health;
mod messages;
mod orders;
mod quote;
mod users;


use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::state::AppState;

pub(crate) const DEFAULT_PAGE: i64 = 1;
pub(crate) const DEFAULT_LIMIT: i64 = 10;
pub(crate) const MAX_LIMIT: i64 = 100;
/// Keeps `(page - 1) * limit` inside i64.
pub(crate) const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// Clamp optional `page`/`limit` query values into a usable window.
pub(crate) fn paging(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page
        .filter(|page| *page > 0)
        .unwrap_or(DEFAULT_PAGE)
        .min(MAX_PAGE);
    let limit = limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    (page, limit)
}

pub(crate) fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/api/pricing", get(quote::pricing))
        .route("/api/quote", get(quote::quote_query).post(quote::quote_body))
        .route("/api/auth/me", get(users::me))
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/api/orders/available", get(orders::available_orders))
        .route(
            "/api/orders/{id}",
            get(orders::get_order).put(orders::update_order),
        )
        .route("/api/orders/{id}/accept", post(orders::accept_order))
        .route("/api/orders/{id}/feedback", post(orders::add_feedback))
        .route("/api/orders/{id}/timeline", get(orders::timeline))
        .route("/api/messages/unread", get(messages::unread_count))
        .route(
            "/api/messages/{id}",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/messages/{id}/read", put(messages::mark_read))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(tracing::Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}
