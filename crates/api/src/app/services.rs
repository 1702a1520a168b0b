use std::sync::Arc;

use boardwise_auth::AccessStore;
use boardwise_infra::{InMemoryAccessStore, MembershipStore};

use crate::config::ApiConfig;

/// Read and write sides of the access store, usually the same backend.
pub struct Stores {
    pub access: Arc<dyn AccessStore>,
    pub memberships: Arc<dyn MembershipStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryAccessStore::new());
        Self {
            access: store.clone(),
            memberships: store,
        }
    }
}

/// Pick the backend from config: Postgres when `DATABASE_URL` is set and the
/// `postgres` feature is enabled, in-memory otherwise.
pub async fn build_stores(config: &ApiConfig) -> anyhow::Result<Stores> {
    #[cfg(feature = "postgres")]
    if let Some(url) = &config.database_url {
        let store = Arc::new(boardwise_infra::PostgresAccessStore::connect(url).await?);
        tracing::info!("using postgres access store");
        return Ok(Stores {
            access: store.clone(),
            memberships: store,
        });
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; ignoring it");
    }

    tracing::info!("using in-memory access store");
    Ok(Stores::in_memory())
}
