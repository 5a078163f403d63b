use std::sync::Arc;

use boost_db::SqlitePool;
use boost_pricing::{Estimator, PriceEstimator, PricingConfig};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub pricing: Arc<PricingConfig>,
    pub estimator: Arc<dyn Estimator + Send + Sync>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, pricing: PricingConfig) -> eyre::Result<Self> {
        let estimator = PriceEstimator::new(pricing.clone())?;
        Ok(Self {
            db_pool,
            pricing: Arc::new(pricing),
            estimator: Arc::new(estimator),
        })
    }

    pub fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
