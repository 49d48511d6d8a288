pub mod memory;
pub mod postgrest;
pub mod store;
pub mod supabase;
pub mod tables;

use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};

pub use memory::MemoryStore;
pub use postgrest::SupabaseStore;
pub use store::{Query, RecordStore, SharedStore, SortOrder, StoreError};

/// Builds the record store selected by `config.store_backend`.
pub fn connect(config: &AppConfig) -> SharedStore {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Arc::new(MemoryStore::clinic())
        }
        StoreBackend::Supabase => {
            info!("Using Supabase record store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(config))
        }
    }
}
