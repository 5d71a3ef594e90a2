use std::sync::Arc;

use autoproposal_infra::{
    AccountService, AppConfig, BoqCatalogService, InMemoryRecordStore, PostgresRecordStore,
    ProposalService, RecordStore, StoreError,
};

/// Every service the handlers reach, sharing one store.
pub struct Services<S> {
    pub accounts: AccountService<S>,
    pub proposals: ProposalService<S>,
    pub catalog: BoqCatalogService<S>,
}

impl<S: RecordStore> Services<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            proposals: ProposalService::new(store.clone()),
            catalog: BoqCatalogService::new(store),
        }
    }
}

/// Store selected by configuration.
pub enum ConfiguredStore {
    InMemory(InMemoryRecordStore),
    Postgres(PostgresRecordStore),
}

pub async fn build_store(config: &AppConfig) -> Result<ConfiguredStore, StoreError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresRecordStore::connect(url).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres record store");
            Ok(ConfiguredStore::Postgres(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory record store");
            Ok(ConfiguredStore::InMemory(InMemoryRecordStore::new()))
        }
    }
}
