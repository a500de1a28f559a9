use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::ClinicStores;

use crate::clock::{Clock, SystemClock};
use crate::locks::KeyedLocks;

/// Everything a scheduling handler needs, shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: ClinicStores,
    pub clock: Arc<dyn Clock>,
    pub booking_locks: Arc<KeyedLocks>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let stores = ClinicStores::from_config(&config);
        Self::with_parts(Arc::new(config), stores, Arc::new(SystemClock))
    }

    pub fn with_parts(config: Arc<AppConfig>, stores: ClinicStores, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            stores,
            clock,
            booking_locks: Arc::new(KeyedLocks::new()),
        }
    }
}
