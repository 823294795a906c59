// omopflow-core/src/application/prerequisites.rs

use tracing::{debug, instrument};

use crate::domain::config::ToolSettings;
use crate::error::OmopflowError;
use crate::ports::process::{CommandSpec, ProcessRunner};

/// Runs `<tool> --version` for every external tool and reports all the ones
/// that cannot be started or exit non-zero in a single error.
#[instrument(skip(runner))]
pub async fn check_prerequisites(
    runner: &dyn ProcessRunner,
    tools: &ToolSettings,
) -> Result<(), OmopflowError> {
    let mut missing = Vec::new();

    for tool in [&tools.git, &tools.psql] {
        let command = CommandSpec::new(tool.as_str()).arg("--version");
        match runner.run(&command).await {
            Ok(output) if output.success() => {
                let version = output.stdout.lines().next().unwrap_or("").trim();
                println!("   ✅ {} found ({})", tool, version);
            }
            Ok(output) => {
                debug!(tool = %tool, code = ?output.code, "Version probe exited non-zero");
                missing.push(tool.clone());
            }
            Err(e) => {
                debug!(tool = %tool, error = %e, "Version probe could not start");
                missing.push(tool.clone());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(OmopflowError::PrerequisiteMissing(missing))
    }
}
