// omopflow/src/commands/mod.rs

pub mod run;
pub mod setup;
pub mod validate;

use anyhow::Context;
use std::path::Path;

use omopflow_core::domain::config::Config;
use omopflow_core::infrastructure::adapters::PostgresConnector;
use omopflow_core::infrastructure::config::load_config;

/// Reads the configuration before anything touches the store or spawns a
/// process.
pub(crate) fn load(config_path: &Path) -> anyhow::Result<Config> {
    load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))
}

pub(crate) fn announce(config: &Config) {
    println!("⚙️  Configuration loaded");
    println!(
        "   Database: {} (staging '{}', target '{}')",
        config.connection.redacted_url(),
        config.connection.staging_schema,
        config.connection.target_schema
    );
}

pub(crate) async fn connect(config: &Config) -> anyhow::Result<PostgresConnector> {
    PostgresConnector::connect(&config.connection)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {}",
                config.connection.redacted_url()
            )
        })
}
