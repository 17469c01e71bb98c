use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};
use tracing::{info, warn};

use crate::errors::{LinkpressError, Result};
use crate::storage::models::{ClickEvent, ListQuery, ShortUrlRecord, SortField, SortOrder};
use crate::storage::UrlStore;

use migration::{Migrator, MigratorTrait, entities::click_event, entities::short_url};

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStore {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LinkpressError::database_config("DATABASE_URL is not set"));
        }

        let db = if backend_name == "sqlite" {
            Self::connect_sqlite(database_url).await?
        } else {
            Self::connect_generic(database_url, backend_name).await?
        };

        let store = SeaOrmStore {
            db,
            backend_name: backend_name.to_string(),
        };

        store.run_migrations().await?;

        warn!("{} store initialized.", store.backend_name.to_uppercase());
        Ok(store)
    }

    /// Connect to SQLite with auto-create and sane pragmas
    async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::SqlitePool;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                LinkpressError::database_config(format!("Failed to parse SQLite URL: {}", e))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
            LinkpressError::database_connection(format!("Failed to connect to SQLite: {}", e))
        })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    async fn connect_generic(database_url: &str, backend_name: &str) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(std::time::Duration::from_secs(8))
            .acquire_timeout(std::time::Duration::from_secs(8))
            .sqlx_logging(false);

        Database::connect(opt).await.map_err(|e| {
            LinkpressError::database_connection(format!(
                "Failed to connect to {} database: {}",
                backend_name.to_uppercase(),
                e
            ))
        })
    }

    async fn run_migrations(&self) -> Result<()> {
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| LinkpressError::database_operation(format!("Migration failed: {}", e)))?;

        info!("Database migrations completed");
        Ok(())
    }

    fn model_to_record(model: short_url::Model, clicks: Vec<ClickEvent>) -> ShortUrlRecord {
        ShortUrlRecord {
            short_code: model.short_code,
            long_url: model.long_url,
            created_at: model.created_at,
            expires_at: model.expires_at,
            clicks,
        }
    }

    fn click_from_model(model: click_event::Model) -> ClickEvent {
        ClickEvent {
            clicked_at: model.clicked_at,
            source: model.source,
        }
    }

    async fn clicks_for_code(&self, code: &str) -> Result<Vec<ClickEvent>> {
        let models = click_event::Entity::find()
            .filter(click_event::Column::ShortCode.eq(code))
            .order_by_asc(click_event::Column::ClickedAt)
            .all(&self.db)
            .await
            .map_err(|e| {
                LinkpressError::database_operation(format!("Failed to load clicks: {}", e))
            })?;

        Ok(models.into_iter().map(Self::click_from_model).collect())
    }
}

#[async_trait]
impl UrlStore for SeaOrmStore {
    async fn get(&self, code: &str) -> Result<Option<ShortUrlRecord>> {
        let model = short_url::Entity::find_by_id(code)
            .one(&self.db)
            .await
            .map_err(|e| {
                LinkpressError::database_operation(format!("Failed to query short url: {}", e))
            })?;

        match model {
            Some(model) => {
                let clicks = self.clicks_for_code(code).await?;
                Ok(Some(Self::model_to_record(model, clicks)))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &ShortUrlRecord) -> Result<()> {
        let active_model = short_url::ActiveModel {
            short_code: Set(record.short_code.clone()),
            long_url: Set(record.long_url.clone()),
            created_at: Set(record.created_at),
            expires_at: Set(record.expires_at),
        };

        match short_url::Entity::insert(active_model).exec(&self.db).await {
            Ok(_) => {
                info!("Short url created: {}", record.short_code);
                Ok(())
            }
            Err(e) => {
                // The primary key doubles as the uniqueness constraint, so a
                // duplicate code surfaces here as a constraint violation
                // rather than needing a prior existence check.
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    Err(LinkpressError::conflict(format!(
                        "Short code '{}' already in use",
                        record.short_code
                    )))
                } else {
                    Err(LinkpressError::database_operation(format!(
                        "Failed to insert short url: {}",
                        e
                    )))
                }
            }
        }
    }

    async fn append_click(&self, code: &str, click: &ClickEvent) -> Result<()> {
        let active_model = click_event::ActiveModel {
            id: NotSet,
            short_code: Set(code.to_string()),
            clicked_at: Set(click.clicked_at),
            source: Set(click.source.clone()),
        };

        click_event::Entity::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkpressError::database_operation(format!("Failed to record click: {}", e))
            })?;

        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ShortUrlRecord>> {
        let column = match query.sort_by {
            SortField::CreatedAt => short_url::Column::CreatedAt,
            SortField::ExpiresAt => short_url::Column::ExpiresAt,
            SortField::ShortCode => short_url::Column::ShortCode,
        };
        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let models = short_url::Entity::find()
            .order_by(column, order)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(|e| {
                LinkpressError::database_operation(format!("Failed to list short urls: {}", e))
            })?;

        if models.is_empty() {
            return Ok(Vec::new());
        }

        // One query for the page's click lists instead of N
        let codes: Vec<String> = models.iter().map(|m| m.short_code.clone()).collect();
        let click_models = click_event::Entity::find()
            .filter(click_event::Column::ShortCode.is_in(codes))
            .order_by_asc(click_event::Column::ClickedAt)
            .all(&self.db)
            .await
            .map_err(|e| {
                LinkpressError::database_operation(format!("Failed to load clicks: {}", e))
            })?;

        let mut clicks_by_code: HashMap<String, Vec<ClickEvent>> = HashMap::new();
        for model in click_models {
            clicks_by_code
                .entry(model.short_code.clone())
                .or_default()
                .push(Self::click_from_model(model));
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let clicks = clicks_by_code.remove(&model.short_code).unwrap_or_default();
                Self::model_to_record(model, clicks)
            })
            .collect())
    }

    async fn backend_name(&self) -> String {
        self.backend_name.clone()
    }
}
