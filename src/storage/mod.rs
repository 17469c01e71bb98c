use std::sync::Arc;

use tracing::error;

use crate::errors::{LinkpressError, Result};

pub mod backends;
pub mod models;

pub use models::{ClickEvent, ListQuery, ShortUrlRecord, SortField, SortOrder};

#[async_trait::async_trait]
pub trait UrlStore: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<ShortUrlRecord>>;

    /// Insert a new record. Fails with `Conflict` if the code is already
    /// taken; uniqueness is enforced atomically by the store, not by a
    /// separate existence check.
    async fn insert(&self, record: &ShortUrlRecord) -> Result<()>;

    /// Append one click event to an existing record
    async fn append_click(&self, code: &str, click: &ClickEvent) -> Result<()>;

    /// Page of records with their click lists, ordered per the query
    async fn list(&self, query: &ListQuery) -> Result<Vec<ShortUrlRecord>>;

    async fn backend_name(&self) -> String;
}

pub struct StoreFactory;

impl StoreFactory {
    pub async fn create() -> Result<Arc<dyn UrlStore>> {
        let config = crate::config::get_config();
        let backend = &config.database.backend;
        let database_url = &config.database.database_url;

        match backend.as_str() {
            "sqlite" | "mysql" | "postgres" | "mariadb" => {
                let store = backends::sea_orm::SeaOrmStore::new(database_url, backend).await?;
                Ok(Arc::new(store) as Arc<dyn UrlStore>)
            }
            _ => {
                error!("Unknown storage backend: {}", backend);
                Err(LinkpressError::database_config(format!(
                    "Unknown storage backend: {}. Supported: sqlite, mysql, postgres, mariadb",
                    backend
                )))
            }
        }
    }
}
