use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    extract::{Query, State},
    Json,
};
use boost_pricing::{
    parse_rating, BoostOptions, BoostRequest, Estimator, PriceQuote, PricingConfig,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Query parameters stay textual so a missing or malformed rating gets the
/// same error body as any other bad input.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    start_rating: Option<String>,
    target_rating: Option<String>,
    options: Option<String>,
}

pub async fn pricing(State(state): State<AppState>) -> Json<PricingConfig> {
    Json(state.pricing.as_ref().clone())
}

pub async fn quote_query(
    State(state): State<AppState>,
    query: std::result::Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<PriceQuote>> {
    let Query(params) = query?;

    let start = parse_rating(params.start_rating.as_deref(), "start_rating")?;
    let target = parse_rating(params.target_rating.as_deref(), "target_rating")?;
    let options = params
        .options
        .as_deref()
        .unwrap_or_default()
        .parse::<BoostOptions>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let quote = state
        .estimator
        .quote(&BoostRequest::new(start, target, options))?;
    Ok(Json(quote))
}

pub async fn quote_body(
    State(state): State<AppState>,
    body: std::result::Result<Json<BoostRequest>, JsonRejection>,
) -> Result<Json<PriceQuote>> {
    let Json(request) = body?;
    let quote = state.estimator.quote(&request)?;
    Ok(Json(quote))
}
