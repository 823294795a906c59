// omopflow-core/src/infrastructure/adapters/process.rs

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::OmopflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::process::{CommandSpec, ProcessOutput, ProcessRunner};

/// Spawns programs directly with `tokio::process`, no shell in between.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    #[instrument(skip(self, command), fields(program = %command.program))]
    async fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, OmopflowError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|source| InfrastructureError::ProcessSpawn {
                program: command.program.clone(),
                source,
            })?;

        debug!(code = ?output.status.code(), "process exited");
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
