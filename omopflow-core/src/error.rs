// omopflow-core/src/error.rs

use crate::domain::error::DomainError;
use crate::domain::stage::Stage;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum OmopflowError {
    // --- DOMAIN ERRORS (identifiers, source files) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, config, database, processes) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- PIPELINE ERRORS ---
    #[error("Missing prerequisites: {}", .0.join(", "))]
    #[diagnostic(
        code(omopflow::setup::prerequisites),
        help("Install the listed tools and make sure they are on your PATH.")
    )]
    PrerequisiteMissing(Vec<String>),

    #[error("Failed to fetch dependency '{name}' with `{command}`: {stderr}")]
    #[diagnostic(code(omopflow::setup::dependency))]
    DependencyFetch {
        name: String,
        command: String,
        stderr: String,
    },

    #[error("Schema provisioning failed on `{command}`: {message}")]
    #[diagnostic(
        code(omopflow::setup::schema),
        help("Is the database running and accessible?")
    )]
    SchemaProvision { command: String, message: String },

    #[error("Script execution failed: `{command}`\n{stderr}")]
    #[diagnostic(code(omopflow::script))]
    ScriptExecution { command: String, stderr: String },

    #[error("Failed to load table '{table}' from {path}: {message}")]
    #[diagnostic(
        code(omopflow::load::table),
        help("The load is idempotent: fix the file and run again.")
    )]
    TableLoad {
        table: String,
        path: String,
        message: String,
    },

    #[error("Cannot start stage '{stage}': {reason}")]
    #[diagnostic(code(omopflow::stage::precondition))]
    Precondition { stage: Stage, reason: String },

    #[error("Stage '{stage}' failed")]
    #[diagnostic(code(omopflow::stage::failed))]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<OmopflowError>,
    },
}

impl OmopflowError {
    /// Wraps a fatal error with the stage it happened in.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ OmopflowError::StageFailed { .. } => already,
            other => OmopflowError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for OmopflowError {
    fn from(err: std::io::Error) -> Self {
        OmopflowError::Infrastructure(InfrastructureError::Io(err))
    }
}
