// omopflow/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use omopflow_core::infrastructure::config::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "omopflow")]
#[command(about = "Provision, load and validate an OMOP CDM database on PostgreSQL", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project directory (scripts, reference files and vendor/ live here)
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Configuration file, relative to the project directory unless absolute
    #[arg(long, global = true, env = "OMOPFLOW_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Debug-level logs on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        if self.config.is_absolute() {
            self.config.clone()
        } else {
            self.project_dir.join(&self.config)
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🛠️  Checks tools, fetches dependencies and creates the schemas
    Setup,

    /// 🚀 Runs the init script, loads reference tables and runs the ETL
    Run,

    /// 🔍 Checks the target schema for expected tables, rows and keys
    Validate {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
