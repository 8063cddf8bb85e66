use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::adaptive::catalog::InMemoryCatalog;
use crate::adaptive::AdaptiveEngine;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    engine: Arc<AdaptiveEngine>,
    catalog: Arc<InMemoryCatalog>,
}

impl AppState {
    pub fn new(config: Config, engine: AdaptiveEngine, catalog: InMemoryCatalog) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            engine: Arc::new(engine),
            catalog: Arc::new(catalog),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &AdaptiveEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn catalog_timeout(&self) -> Duration {
        self.config.catalog_timeout
    }
}
