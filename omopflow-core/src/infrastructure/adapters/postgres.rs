// omopflow-core/src/infrastructure/adapters/postgres.rs

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, instrument};

use crate::domain::config::ConnectionSettings;
use crate::error::OmopflowError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::Connector;

const LIST_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name";

const SCHEMA_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1)";

pub struct PostgresConnector {
    client: Client,
}

impl PostgresConnector {
    /// Opens one connection. The connection future is driven by a background
    /// task for as long as the client lives.
    #[instrument(skip(settings), fields(url = %settings.redacted_url()))]
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self, InfrastructureError> {
        let (client, connection) =
            tokio_postgres::connect(&settings.connection_url(None), NoTls).await?;

        let host = settings.host.clone();
        let port = settings.port;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error ({}:{}): {}", host, port, e);
            }
        });

        info!("Connected to PostgreSQL");
        Ok(Self { client })
    }
}

fn db_error(err: tokio_postgres::Error) -> OmopflowError {
    OmopflowError::Infrastructure(InfrastructureError::from(err))
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn execute(&self, query: &str) -> Result<(), OmopflowError> {
        debug!(query, "execute");
        // Simple-query protocol: allows transaction control and DDL alike.
        self.client.batch_execute(query).await.map_err(db_error)
    }

    async fn query_scalar(&self, query: &str) -> Result<i64, OmopflowError> {
        debug!(query, "query_scalar");
        let row = self
            .client
            .query_opt(query, &[])
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                OmopflowError::Infrastructure(InfrastructureError::Database(
                    DatabaseError::EmptyResult(query.to_string()),
                ))
            })?;
        row.try_get::<_, i64>(0).map_err(db_error)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, OmopflowError> {
        let rows = self
            .client
            .query(LIST_TABLES, &[&schema])
            .await
            .map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(db_error))
            .collect()
    }

    async fn schema_exists(&self, schema: &str) -> Result<bool, OmopflowError> {
        let row = self
            .client
            .query_one(SCHEMA_EXISTS, &[&schema])
            .await
            .map_err(db_error)?;
        row.try_get::<_, bool>(0).map_err(db_error)
    }

    fn engine_name(&self) -> &str {
        "postgres"
    }
}
