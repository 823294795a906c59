// omopflow-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("PostgreSQL Error: {0}")]
    #[diagnostic(
        code(omopflow::infra::database::postgres),
        help("Check that the server is running and the credentials in the config file are correct.")
    )]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Query returned no rows: {0}")]
    #[diagnostic(code(omopflow::infra::database::empty_result))]
    EmptyResult(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(omopflow::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(omopflow::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration file not found at '{0}'")]
    #[diagnostic(
        code(omopflow::infra::config_missing),
        help("Create it from omopflow.example.yaml and fill in your details, then run `omopflow setup` first.")
    )]
    ConfigMissing(String),

    #[error("Configuration is missing required key '{section}.{key}'")]
    #[diagnostic(code(omopflow::infra::config_incomplete))]
    ConfigIncomplete { section: String, key: String },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(omopflow::infra::config_invalid))]
    ConfigInvalid(String),

    // --- TABULAR SOURCES ---
    #[error("CSV Error in {path}: {source}")]
    #[diagnostic(
        code(omopflow::infra::csv),
        help("Check quoting and that every row has as many fields as the header.")
    )]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    // --- PROCESSES ---
    #[error("Could not start '{program}': {source}")]
    #[diagnostic(
        code(omopflow::infra::process_spawn),
        help("Is the program installed and on your PATH?")
    )]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// Manual implementation for shortcuts (e.g. `?` operator on client calls)
impl From<tokio_postgres::Error> for InfrastructureError {
    fn from(err: tokio_postgres::Error) -> Self {
        InfrastructureError::Database(DatabaseError::Postgres(err))
    }
}
