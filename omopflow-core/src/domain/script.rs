// omopflow-core/src/domain/script.rs

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptSource {
    File(PathBuf),
    /// A single SQL command, used for provisioning statements.
    Inline(String),
}

/// A script plus the named variables it may reference (`:NAME` in psql).
/// Variables keep their declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInvocation {
    pub source: ScriptSource,
    pub variables: Vec<(String, String)>,
}

impl ScriptInvocation {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            source: ScriptSource::File(path.as_ref().to_path_buf()),
            variables: Vec::new(),
        }
    }

    pub fn inline(sql: impl Into<String>) -> Self {
        Self {
            source: ScriptSource::Inline(sql.into()),
            variables: Vec::new(),
        }
    }

    /// Adds a substitution. A repeated name replaces the earlier value in place.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.variables.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.variables.push((name, value)),
        }
        self
    }

    /// Short label for logs: the file path or the SQL text.
    pub fn label(&self) -> String {
        match &self.source {
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Inline(sql) => sql.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_keep_order_and_replace() {
        let inv = ScriptInvocation::file("etl/etl.sql")
            .var("OMOP_SCHEMA", "omop")
            .var("MIMIC_SCHEMA", "mimiciii")
            .var("OMOP_SCHEMA", "cdm");

        assert_eq!(
            inv.variables,
            vec![
                ("OMOP_SCHEMA".to_string(), "cdm".to_string()),
                ("MIMIC_SCHEMA".to_string(), "mimiciii".to_string()),
            ]
        );
        assert_eq!(inv.label(), "etl/etl.sql");
    }

    #[test]
    fn test_inline_label() {
        let inv = ScriptInvocation::inline("CREATE SCHEMA IF NOT EXISTS \"omop\";");
        assert_eq!(inv.label(), "CREATE SCHEMA IF NOT EXISTS \"omop\";");
    }
}
