//! Shared state every job loop clones a handle to: the database, the
//! market gateway, the weather fetch plumbing, the live ensemble, and the
//! event bus.

use common::{AppConfig, City};
use events::EventSender;
use market::MarketGateway;
use prediction::ensemble::Ensemble;
use std::sync::Arc;
use storage::SharedDatabase;
use tokio::sync::RwLock;
use weather::grid_cache::GridCache;
use weather::rate_limit::RateLimiters;

#[derive(Clone)]
pub struct JobContext {
    pub db: SharedDatabase,
    pub gateway: Arc<dyn MarketGateway>,
    pub ensemble: Arc<RwLock<Ensemble>>,
    pub events: EventSender,
    pub grid_cache: GridCache,
    pub rate_limiters: RateLimiters,
    pub config: Arc<AppConfig>,
    pub operator_id: i64,
}

impl JobContext {
    pub fn cities(&self) -> Vec<City> {
        self.config.cities.iter().map(|c| c.city).collect()
    }
}
