// omopflow-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("'{0}' is not a valid SQL identifier")]
    #[diagnostic(
        code(omopflow::domain::identifier),
        help("Use letters, digits and underscores only, starting with a letter or underscore.")
    )]
    InvalidIdentifier(String),

    #[error("Cannot derive a table name from '{0}'")]
    #[diagnostic(code(omopflow::domain::source_file))]
    InvalidSourceFile(String),

    #[error("Column '{column}' appears more than once in {source_name}")]
    #[diagnostic(
        code(omopflow::domain::duplicate_column),
        help("Headers are lower-cased before loading, so 'Code' and 'code' collide.")
    )]
    DuplicateColumn {
        source_name: String,
        column: String,
    },

    #[error("{0} has no header row")]
    #[diagnostic(code(omopflow::domain::empty_source))]
    EmptySource(String),
}
