// omopflow-core/src/application/provisioning.rs

use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::application::script::ScriptRunner;
use crate::domain::config::Dependency;
use crate::domain::quoter::{quote_ident, validate_identifier};
use crate::domain::script::ScriptInvocation;
use crate::error::OmopflowError;
use crate::ports::process::{CommandSpec, ProcessRunner};

// --- SCHEMAS ---

pub struct SchemaProvisioner<'a> {
    scripts: &'a ScriptRunner<'a>,
}

impl<'a> SchemaProvisioner<'a> {
    pub fn new(scripts: &'a ScriptRunner<'a>) -> Self {
        Self { scripts }
    }

    /// `CREATE SCHEMA IF NOT EXISTS` once per distinct name, in order.
    #[instrument(skip(self))]
    pub async fn ensure_schemas(&self, schemas: &[&str]) -> Result<(), OmopflowError> {
        let mut seen: Vec<&str> = Vec::new();
        for schema in schemas.iter().copied() {
            if seen.contains(&schema) {
                continue;
            }
            seen.push(schema);

            validate_identifier(schema)?;
            let sql = format!("CREATE SCHEMA IF NOT EXISTS {};", quote_ident(schema));
            let invocation = ScriptInvocation::inline(sql.as_str());

            self.scripts.run(&invocation).await.map_err(|e| match e {
                OmopflowError::ScriptExecution { command, stderr } => {
                    OmopflowError::SchemaProvision {
                        command,
                        message: stderr,
                    }
                }
                other => OmopflowError::SchemaProvision {
                    command: sql.clone(),
                    message: other.to_string(),
                },
            })?;

            println!("   ✅ Schema '{}' ready", schema);
        }
        Ok(())
    }
}

// --- VENDORED REPOSITORIES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyPresent,
    Fetched,
}

pub struct DependencyProvisioner<'a> {
    runner: &'a dyn ProcessRunner,
    git: &'a str,
}

impl<'a> DependencyProvisioner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, git: &'a str) -> Self {
        Self { runner, git }
    }

    /// Clones `dependency` into `vendor_dir/<name>` unless that path exists.
    /// An existing destination is never touched.
    #[instrument(skip(self), fields(name = %dependency.name))]
    pub async fn ensure_repository(
        &self,
        dependency: &Dependency,
        vendor_dir: &Path,
    ) -> Result<ProvisionOutcome, OmopflowError> {
        let dest = vendor_dir.join(&dependency.name);
        if dest.exists() {
            println!(
                "   ⏭️  {} already present at {}",
                dependency.name,
                dest.display()
            );
            return Ok(ProvisionOutcome::AlreadyPresent);
        }

        fs::create_dir_all(vendor_dir)?;

        let command = CommandSpec::new(self.git).args([
            "clone".to_string(),
            dependency.url.clone(),
            dest.display().to_string(),
        ]);
        println!("   📥 Cloning {} ...", dependency.name);

        let output = self.runner.run(&command).await?;
        if !output.success() {
            return Err(OmopflowError::DependencyFetch {
                name: dependency.name.clone(),
                command: command.display(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        info!(dest = %dest.display(), "Dependency fetched");
        Ok(ProvisionOutcome::Fetched)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::config::default_dependencies;
    use crate::domain::config::fixtures::sample_config;
    use crate::ports::mock::{MockProcessRunner, MockResponse};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_schemas_created_once_each() -> anyhow::Result<()> {
        let config = sample_config();
        let runner = MockProcessRunner::new();
        let scripts = ScriptRunner::new(&runner, &config.connection, "psql", ".");

        SchemaProvisioner::new(&scripts)
            .ensure_schemas(&["public", "omop", "public"])
            .await?;

        let sql: Vec<String> = runner
            .commands()
            .iter()
            .map(|c| c.args.last().cloned().unwrap())
            .collect();
        assert_eq!(
            sql,
            vec![
                "CREATE SCHEMA IF NOT EXISTS \"public\";",
                "CREATE SCHEMA IF NOT EXISTS \"omop\";"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_schema_failure_is_fatal() {
        let config = sample_config();
        let runner = MockProcessRunner::new().respond(
            "psql",
            MockResponse::fail(2, "psql: error: connection refused"),
        );
        let scripts = ScriptRunner::new(&runner, &config.connection, "psql", ".");

        let err = SchemaProvisioner::new(&scripts)
            .ensure_schemas(&["omop"])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OmopflowError::SchemaProvision { ref message, .. } if message.contains("connection refused")
        ));
        assert_eq!(runner.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_repository_is_not_cloned() -> anyhow::Result<()> {
        let vendor = tempdir()?;
        fs::create_dir(vendor.path().join("CommonDataModel"))?;
        let runner = MockProcessRunner::new();

        let outcome = DependencyProvisioner::new(&runner, "git")
            .ensure_repository(&default_dependencies()[0], vendor.path())
            .await?;

        assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
        assert!(runner.commands().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_repository_is_cloned() -> anyhow::Result<()> {
        let root = tempdir()?;
        let vendor = root.path().join("vendor");
        let runner = MockProcessRunner::new();

        let outcome = DependencyProvisioner::new(&runner, "git")
            .ensure_repository(&default_dependencies()[0], &vendor)
            .await?;

        assert_eq!(outcome, ProvisionOutcome::Fetched);
        assert!(vendor.is_dir());
        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0].args,
            vec![
                "clone".to_string(),
                "https://github.com/OHDSI/CommonDataModel.git".to_string(),
                vendor.join("CommonDataModel").display().to_string(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_clone_failure_is_fatal() -> anyhow::Result<()> {
        let vendor = tempdir()?;
        let runner = MockProcessRunner::new()
            .respond("git", MockResponse::fail(128, "fatal: repository not found\n"));

        let err = DependencyProvisioner::new(&runner, "git")
            .ensure_repository(&default_dependencies()[0], vendor.path())
            .await
            .unwrap_err();

        match err {
            OmopflowError::DependencyFetch { name, stderr, .. } => {
                assert_eq!(name, "CommonDataModel");
                assert_eq!(stderr, "fatal: repository not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
