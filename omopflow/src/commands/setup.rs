// omopflow/src/commands/setup.rs
//
// USE CASE: Prepare the environment (tools, vendored repositories, schemas).

use std::path::Path;

use omopflow_core::application::PipelineOrchestrator;
use omopflow_core::infrastructure::adapters::SystemProcessRunner;

pub async fn execute(project_dir: &Path, config_path: &Path) -> anyhow::Result<()> {
    let config = super::load(config_path)?;
    super::announce(&config);
    let runner = SystemProcessRunner;

    let summary = PipelineOrchestrator::new(&config, project_dir, &runner)
        .setup()
        .await?;

    if !summary.vocabulary_found {
        println!("   ℹ️  Remember to download the vocabularies before `omopflow run`.");
    }
    Ok(())
}
