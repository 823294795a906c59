// omopflow-core/src/application/loader.rs

use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::domain::config::LoaderSettings;
use crate::domain::quoter::{qualified, quote_ident, quote_literal};
use crate::domain::table::TableSpec;
use crate::error::OmopflowError;
use crate::infrastructure::fs::discover_tabular_files;
use crate::infrastructure::tabular::read_tabular_file;
use crate::ports::connector::Connector;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadedTable {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadSummary {
    pub schema: String,
    pub tables: Vec<LoadedTable>,
}

impl LoadSummary {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Replaces one table per reference file in the destination schema. Tables
/// are built in the staging schema first, then moved.
pub struct TabularLoader<'a> {
    connector: &'a dyn Connector,
    settings: &'a LoaderSettings,
    staging_schema: &'a str,
}

impl<'a> TabularLoader<'a> {
    pub fn new(
        connector: &'a dyn Connector,
        settings: &'a LoaderSettings,
        staging_schema: &'a str,
    ) -> Self {
        Self {
            connector,
            settings,
            staging_schema,
        }
    }

    /// Loads every `*.csv` directly under `dir` into `schema` inside a single
    /// transaction. On the first failure the transaction is rolled back.
    #[instrument(skip(self), fields(engine = self.connector.engine_name()))]
    pub async fn load_directory(
        &self,
        dir: &Path,
        schema: &str,
    ) -> Result<LoadSummary, OmopflowError> {
        let files = discover_tabular_files(dir)?;
        info!(count = files.len(), "Discovered reference files");

        self.connector.begin().await?;

        let mut summary = LoadSummary {
            schema: schema.to_string(),
            tables: Vec::with_capacity(files.len()),
        };

        for file in &files {
            match self.load_file(file, schema).await {
                Ok(loaded) => {
                    println!("   📥 {} ({} rows)", loaded.table, loaded.rows);
                    summary.tables.push(loaded);
                }
                Err(e) => {
                    if let Err(rollback_err) = self.connector.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    return Err(e);
                }
            }
        }

        self.connector.commit().await?;
        info!(
            tables = summary.tables.len(),
            rows = summary.total_rows(),
            "Reference tables committed"
        );
        Ok(summary)
    }

    async fn load_file(&self, file: &Path, schema: &str) -> Result<LoadedTable, OmopflowError> {
        let table_load = |table: &str, message: String| OmopflowError::TableLoad {
            table: table.to_string(),
            path: file.display().to_string(),
            message,
        };

        let spec = TableSpec::from_path(file, &self.settings.table_prefix, schema)
            .map_err(|e| table_load(&file.display().to_string(), e.to_string()))?;

        self.load_table(&spec)
            .await
            .map_err(|e| table_load(&spec.table, e.to_string()))
    }

    async fn load_table(&self, spec: &TableSpec) -> Result<LoadedTable, OmopflowError> {
        let destination = spec.qualified_name();
        let staging = qualified(self.staging_schema, &spec.table);

        self.connector
            .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", destination))
            .await?;

        let data = read_tabular_file(&spec.source)?;
        let types = data.column_types();
        debug!(table = %spec.table, columns = data.columns.len(), "Inferred column types");

        if staging != destination {
            self.connector
                .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", staging))
                .await?;
        }
        self.connector
            .execute(&data.create_table_sql(&staging, &types))
            .await?;
        for insert in data.insert_statements(&staging, &types, self.settings.batch_size) {
            self.connector.execute(&insert).await?;
        }

        if staging != destination {
            self.connector
                .execute(&format!(
                    "ALTER TABLE {} SET SCHEMA {}",
                    staging,
                    quote_ident(&spec.schema)
                ))
                .await?;
        }

        let sequence = qualified(&spec.schema, &self.settings.sequence);
        self.connector
            .execute(&format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} INTEGER DEFAULT nextval({}::regclass)",
                destination,
                quote_ident(&self.settings.surrogate_column),
                quote_literal(&sequence)
            ))
            .await?;

        Ok(LoadedTable {
            table: spec.table.clone(),
            rows: data.rows.len(),
        })
    }
}
