//! Shared application state

use crate::{
    config::Config,
    db::{
        CommunicationStore, PostgresCommunicationStore, PostgresPractitionerDirectory,
        PostgresRecordStore, PractitionerDirectory, RecordStore,
    },
    services::{CommunicationService, DispatchClient, ExchangeService, RecordService},
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub records: Arc<RecordService>,
    pub communications: Arc<CommunicationService>,
    pub exchange: Arc<ExchangeService>,
}

impl AppState {
    /// Initialize state backed by Postgres, running migrations when
    /// configured.
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let config = Arc::new(config);
        let db_pool = create_db_pool(config.as_ref()).await?;

        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&db_pool)
                .await
                .map_err(|e| crate::Error::Internal(format!("Migration failed: {}", e)))?;
        }

        let records: Arc<dyn RecordStore> = Arc::new(PostgresRecordStore::new(db_pool.clone()));
        let communications: Arc<dyn CommunicationStore> =
            Arc::new(PostgresCommunicationStore::new(db_pool.clone()));
        let practitioners: Arc<dyn PractitionerDirectory> =
            Arc::new(PostgresPractitionerDirectory::new(db_pool));

        Self::with_stores(config, records, communications, practitioners)
    }

    /// Wire the services over explicit stores. Tests use this with the
    /// in-memory implementations.
    pub fn with_stores(
        config: Arc<Config>,
        records: Arc<dyn RecordStore>,
        communications: Arc<dyn CommunicationStore>,
        practitioners: Arc<dyn PractitionerDirectory>,
    ) -> Result<Self> {
        let dispatch = Arc::new(DispatchClient::new(&config.registry)?);

        let record_service = Arc::new(RecordService::new(records.clone(), practitioners.clone()));
        let communication_service = Arc::new(CommunicationService::new(
            communications.clone(),
            records.clone(),
            practitioners.clone(),
        ));
        let exchange_service = Arc::new(ExchangeService::new(
            records,
            practitioners,
            communications,
            dispatch,
        ));

        Ok(Self {
            config,
            records: record_service,
            communications: communication_service,
            exchange: exchange_service,
        })
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .connect(&config.database.url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
