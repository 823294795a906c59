// omopflow-core/src/application/script.rs

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::config::ConnectionSettings;
use crate::domain::script::{ScriptInvocation, ScriptSource};
use crate::error::OmopflowError;
use crate::ports::process::{CommandSpec, ProcessRunner};

const STDOUT_PREVIEW: usize = 200;

/// Executes SQL through the `psql` client against the configured database.
pub struct ScriptRunner<'a> {
    runner: &'a dyn ProcessRunner,
    connection: &'a ConnectionSettings,
    psql: &'a str,
    /// Relative script paths resolve against this directory. Always absolute,
    /// the child inherits the caller's working directory.
    base_dir: PathBuf,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        connection: &'a ConnectionSettings,
        psql: &'a str,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        let base_dir = base_dir.into();
        Self {
            runner,
            connection,
            psql,
            base_dir: std::path::absolute(&base_dir).unwrap_or(base_dir),
        }
    }

    /// Builds the client invocation. The password travels only in
    /// `PGPASSWORD`, never in the argument vector.
    pub fn command_for(&self, invocation: &ScriptInvocation) -> CommandSpec {
        let conn = self.connection;
        let mut command = CommandSpec::new(self.psql)
            .args(["-X", "-v", "ON_ERROR_STOP=1"])
            .args(["-h", conn.host.as_str()])
            .args(["-p".to_string(), conn.port.to_string()])
            .args(["-U", conn.user.as_str()])
            .args(["-d", conn.database.as_str()]);

        for (name, value) in &invocation.variables {
            command = command.arg("--set").arg(format!("{}={}", name, value));
        }

        command = match &invocation.source {
            ScriptSource::File(path) => command
                .arg("-f")
                .arg(self.resolve(path).display().to_string()),
            ScriptSource::Inline(sql) => command.arg("-c").arg(sql.as_str()),
        };

        if !conn.password().is_empty() {
            command = command.env("PGPASSWORD", conn.password());
        }
        command
    }

    /// Runs the script and returns its standard output.
    #[instrument(skip(self, invocation), fields(script = %invocation.label()))]
    pub async fn run(&self, invocation: &ScriptInvocation) -> Result<String, OmopflowError> {
        let command = self.command_for(invocation);
        debug!(command = %command.display(), "Spawning SQL client");

        let output = self.runner.run(&command).await?;
        if !output.success() {
            return Err(OmopflowError::ScriptExecution {
                command: command.display(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        let preview: String = output.stdout.chars().take(STDOUT_PREVIEW).collect();
        info!(output = %preview.trim(), "Script completed");
        Ok(output.stdout)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
