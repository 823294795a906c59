// omopflow/src/commands/validate.rs
//
// USE CASE: Post-load checks. Returns whether the report passed.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use omopflow_core::application::PipelineOrchestrator;
use omopflow_core::domain::validation::{CheckOutcome, ValidationReport};
use omopflow_core::infrastructure::adapters::SystemProcessRunner;

use crate::cli::OutputFormat;

pub async fn execute(
    project_dir: &Path,
    config_path: &Path,
    format: OutputFormat,
) -> anyhow::Result<bool> {
    let config = super::load(config_path)?;
    if format == OutputFormat::Table {
        super::announce(&config);
        println!(
            "🔍 Inspecting schema '{}'...",
            config.connection.target_schema
        );
    }

    let connector = super::connect(&config).await?;
    let runner = SystemProcessRunner;
    let report = PipelineOrchestrator::new(&config, project_dir, &runner)
        .validate(&connector)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Table => print_ledger(&report),
    }
    Ok(report.passed())
}

fn outcome_label(outcome: CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::Pass => "✅ pass",
        CheckOutcome::Warning => "⚠️  warning",
        CheckOutcome::Fail => "❌ fail",
        CheckOutcome::Skipped => "⏭️  skipped",
    }
}

pub(crate) fn render_ledger(report: &ValidationReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Table", "Check", "Outcome", "Detail"]);

    for result in &report.results {
        table.add_row(vec![
            result.check.table.clone(),
            result.check.kind.to_string(),
            outcome_label(result.outcome).to_string(),
            result.detail.clone(),
        ]);
    }
    table
}

fn print_ledger(report: &ValidationReport) {
    println!("{}", render_ledger(report));

    let counts = report.counts();
    println!(
        "\n📊 {} passed, {} warnings, {} failed, {} skipped",
        counts.passed, counts.warnings, counts.failed, counts.skipped
    );
    let missing = report.missing_tables();
    if !missing.is_empty() {
        println!("   Missing tables: {}", missing.join(", "));
    }

    if report.passed() {
        println!("\n✨ SUCCESS! Schema '{}' passed validation.", report.schema);
    } else {
        eprintln!("\n❌ FAILURE. Schema '{}' failed validation.", report.schema);
    }
}
