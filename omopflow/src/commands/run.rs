// omopflow/src/commands/run.rs
//
// USE CASE: Init script -> reference tables -> ETL script.

use std::path::Path;

use omopflow_core::application::PipelineOrchestrator;
use omopflow_core::domain::stage::Stage;
use omopflow_core::infrastructure::adapters::SystemProcessRunner;
use omopflow_core::ports::connector::Connector;

pub async fn execute(project_dir: &Path, config_path: &Path) -> anyhow::Result<()> {
    let config = super::load(config_path)?;
    super::announce(&config);
    let runner = SystemProcessRunner;
    let orchestrator = PipelineOrchestrator::new(&config, project_dir, &runner);

    // File preconditions are checked before connecting.
    orchestrator
        .check_load_preconditions()
        .map_err(|e| e.in_stage(Stage::Load))?;

    let connector = super::connect(&config).await?;
    println!("   Engine: {} 🐘", connector.engine_name());

    let summary = orchestrator.load(&connector).await?;
    for table in &summary.tables {
        tracing::debug!(table = %table.table, rows = table.rows, "Loaded");
    }

    println!("\n✨ SUCCESS! Schema '{}' is ready for `omopflow validate`.", summary.schema);
    Ok(())
}
