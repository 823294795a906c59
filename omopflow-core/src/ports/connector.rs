// omopflow-core/src/ports/connector.rs

// What the pipeline needs from the relational store, without knowing which
// driver provides it.

use crate::error::OmopflowError;
use async_trait::async_trait;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs a statement and discards any rows.
    async fn execute(&self, query: &str) -> Result<(), OmopflowError>;

    /// First column of the first row, as an integer (e.g. `SELECT COUNT(*) ...`).
    async fn query_scalar(&self, query: &str) -> Result<i64, OmopflowError>;

    /// Base table names in `schema`.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, OmopflowError>;

    async fn schema_exists(&self, schema: &str) -> Result<bool, OmopflowError>;

    async fn begin(&self) -> Result<(), OmopflowError> {
        self.execute("BEGIN").await
    }

    async fn commit(&self) -> Result<(), OmopflowError> {
        self.execute("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), OmopflowError> {
        self.execute("ROLLBACK").await
    }

    fn engine_name(&self) -> &str;
}
