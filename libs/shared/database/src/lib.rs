pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;

use std::sync::Arc;

use shared_config::{AppConfig, StoreBackend};
use tracing::info;

pub use memory::MemoryStore;
pub use postgrest::SupabaseStore;
pub use store::{AppointmentStore, DirectoryStore, ScheduleStore, StoreError, StoreResult};

/// Handles to every store the scheduling cells read from or write to.
#[derive(Clone)]
pub struct ClinicStores {
    pub schedules: Arc<dyn ScheduleStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub directory: Arc<dyn DirectoryStore>,
}

impl ClinicStores {
    /// One backend serving all three store roles.
    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: ScheduleStore + AppointmentStore + DirectoryStore + 'static,
    {
        Self {
            schedules: store.clone(),
            appointments: store.clone(),
            directory: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match config.effective_store_backend() {
            StoreBackend::Supabase => {
                info!("Using Supabase store at {}", config.supabase_url);
                Self::from_backend(Arc::new(SupabaseStore::new(config)))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Self::in_memory()
            }
        }
    }
}
