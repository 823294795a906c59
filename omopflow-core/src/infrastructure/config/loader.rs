// omopflow-core/src/infrastructure/config/loader.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::config::{
    Config, ConnectionSettings, Dependency, LoaderSettings, PathSettings, ToolSettings,
    default_dependencies,
};
use crate::domain::validation::ValidationCatalog;
use crate::infrastructure::error::InfrastructureError;

pub const DEFAULT_CONFIG_FILE: &str = "omopflow.yaml";

// --- RAW FILE LAYOUT ---
// Every key is optional here so absent keys can be reported by name.

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    postgresql: Option<RawConnection>,
    paths: Option<RawPaths>,
    #[serde(default)]
    loader: RawLoader,
    dependencies: Option<Vec<RawDependency>>,
    #[serde(default)]
    tools: RawTools,
    validation: Option<RawValidation>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConnection {
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<PortValue>,
    database: Option<String>,
    staging_schema: Option<String>,
    target_schema: Option<String>,
}

/// Ports are accepted both as `5432` and `"5432"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawPaths {
    athena_vocab: Option<PathBuf>,
    concept_dir: Option<PathBuf>,
    init_script: Option<PathBuf>,
    etl_script: Option<PathBuf>,
    vendor_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLoader {
    table_prefix: Option<String>,
    surrogate_column: Option<String>,
    sequence: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
    name: String,
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTools {
    psql: Option<String>,
    git: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawValidation {
    tables: Option<Vec<String>>,
    // Mapping keeps file order, so the report follows the file.
    primary_keys: Option<serde_yaml::Mapping>,
}

// --- LOADER ---

#[instrument]
pub fn load_config(path: &Path) -> Result<Config, InfrastructureError> {
    if !path.exists() {
        return Err(InfrastructureError::ConfigMissing(
            path.display().to_string(),
        ));
    }
    info!(path = ?path, "Loading configuration");

    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    // Layering: the environment wins over the file.
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigInvalid(e.to_string()))?;

    Ok(config)
}

fn parse_config(content: &str) -> Result<Config, InfrastructureError> {
    let raw: RawConfig = if content.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(content)?
    };

    let conn = raw.postgresql.unwrap_or_default();
    let connection = ConnectionSettings {
        user: required("postgresql", "user", conn.user)?,
        password: conn.password,
        host: required("postgresql", "host", conn.host)?,
        port: parse_port(required("postgresql", "port", conn.port)?)?,
        database: required("postgresql", "database", conn.database)?,
        staging_schema: required("postgresql", "staging_schema", conn.staging_schema)?,
        target_schema: required("postgresql", "target_schema", conn.target_schema)?,
    };

    let raw_paths = raw.paths.unwrap_or_default();
    let mut paths =
        PathSettings::with_vocabulary(required("paths", "athena_vocab", raw_paths.athena_vocab)?);
    if let Some(p) = raw_paths.concept_dir {
        paths.concept_dir = p;
    }
    if let Some(p) = raw_paths.init_script {
        paths.init_script = p;
    }
    if let Some(p) = raw_paths.etl_script {
        paths.etl_script = p;
    }
    if let Some(p) = raw_paths.vendor_dir {
        paths.vendor_dir = p;
    }

    let defaults = LoaderSettings::default();
    let loader = LoaderSettings {
        table_prefix: raw.loader.table_prefix.unwrap_or(defaults.table_prefix),
        surrogate_column: raw
            .loader
            .surrogate_column
            .unwrap_or(defaults.surrogate_column),
        sequence: raw.loader.sequence.unwrap_or(defaults.sequence),
        batch_size: raw.loader.batch_size.unwrap_or(defaults.batch_size),
    };

    let dependencies = match raw.dependencies {
        Some(deps) => deps
            .into_iter()
            .map(|d| Dependency {
                name: d.name,
                url: d.url,
            })
            .collect(),
        None => default_dependencies(),
    };

    let tool_defaults = ToolSettings::default();
    let tools = ToolSettings {
        psql: raw.tools.psql.unwrap_or(tool_defaults.psql),
        git: raw.tools.git.unwrap_or(tool_defaults.git),
    };

    Ok(Config {
        connection,
        paths,
        loader,
        dependencies,
        tools,
        validation: validation_catalog(raw.validation)?,
    })
}

fn required<T>(section: &str, key: &str, value: Option<T>) -> Result<T, InfrastructureError> {
    value.ok_or_else(|| InfrastructureError::ConfigIncomplete {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn parse_port(value: PortValue) -> Result<u16, InfrastructureError> {
    match value {
        PortValue::Number(n) => Ok(n),
        PortValue::Text(s) => s.trim().parse().map_err(|_| {
            InfrastructureError::ConfigInvalid(format!("postgresql.port '{}' is not a port", s))
        }),
    }
}

fn validation_catalog(raw: Option<RawValidation>) -> Result<ValidationCatalog, InfrastructureError> {
    let mut catalog = ValidationCatalog::default();
    let Some(raw) = raw else {
        return Ok(catalog);
    };

    if let Some(tables) = raw.tables {
        catalog.tables = tables;
    }
    if let Some(mapping) = raw.primary_keys {
        catalog.primary_keys = mapping
            .into_iter()
            .map(|(table, column)| match (table.as_str(), column.as_str()) {
                (Some(t), Some(c)) => Ok((t.to_string(), c.to_string())),
                _ => Err(InfrastructureError::ConfigInvalid(
                    "validation.primary_keys must map table names to column names".to_string(),
                )),
            })
            .collect::<Result<_, _>>()?;
    }
    Ok(catalog)
}

/// `OMOPFLOW_PASSWORD`, `OMOPFLOW_HOST` and `OMOPFLOW_PORT` override the file.
fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("OMOPFLOW_PASSWORD") {
        info!("Overriding password via ENV");
        config.connection.password = Some(val);
    }
    if let Some(val) = lookup("OMOPFLOW_HOST") {
        info!(old = %config.connection.host, new = %val, "Overriding host via ENV");
        config.connection.host = val;
    }
    if let Some(val) = lookup("OMOPFLOW_PORT") {
        config.connection.port = parse_port(PortValue::Text(val))?;
        info!(port = config.connection.port, "Overriding port via ENV");
    }
    Ok(())
}
