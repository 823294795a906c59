// omopflow-core/src/application/pipeline.rs

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::application::loader::{LoadSummary, TabularLoader};
use crate::application::prerequisites::check_prerequisites;
use crate::application::provisioning::{
    DependencyProvisioner, ProvisionOutcome, SchemaProvisioner,
};
use crate::application::script::ScriptRunner;
use crate::application::validation::ValidationSuite;
use crate::domain::config::Config;
use crate::domain::script::ScriptInvocation;
use crate::domain::stage::Stage;
use crate::domain::validation::ValidationReport;
use crate::error::OmopflowError;
use crate::ports::connector::Connector;
use crate::ports::process::ProcessRunner;

const ATHENA_URL: &str = "https://athena.ohdsi.org/";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupSummary {
    pub fetched: Vec<String>,
    pub already_present: Vec<String>,
    pub vocabulary_found: bool,
}

/// Drives the stages in order. Every fatal error comes back wrapped in
/// [`OmopflowError::StageFailed`]; nothing here exits the process.
pub struct PipelineOrchestrator<'a> {
    config: &'a Config,
    project_dir: PathBuf,
    runner: &'a dyn ProcessRunner,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        config: &'a Config,
        project_dir: impl Into<PathBuf>,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        let project_dir = project_dir.into();
        Self {
            config,
            project_dir: std::path::absolute(&project_dir).unwrap_or(project_dir),
            runner,
        }
    }

    // --- SETUP ---

    #[instrument(skip(self))]
    pub async fn setup(&self) -> Result<SetupSummary, OmopflowError> {
        println!("🚀 Starting setup...");
        let start = Instant::now();

        let summary = self
            .run_setup()
            .await
            .map_err(|e| e.in_stage(Stage::Setup))?;

        println!("🎉 Setup finished in {:.2?}", start.elapsed());
        if let Some(next) = Stage::Setup.next() {
            println!("   Next stage: {} (`omopflow run`)", next);
        }
        Ok(summary)
    }

    async fn run_setup(&self) -> Result<SetupSummary, OmopflowError> {
        let mut summary = SetupSummary::default();

        println!("🔍 Checking prerequisites...");
        check_prerequisites(self.runner, &self.config.tools).await?;

        println!("📦 Provisioning dependencies...");
        let vendor_dir = self.resolve(&self.config.paths.vendor_dir);
        let provisioner = DependencyProvisioner::new(self.runner, &self.config.tools.git);
        for dependency in &self.config.dependencies {
            match provisioner.ensure_repository(dependency, &vendor_dir).await? {
                ProvisionOutcome::Fetched => summary.fetched.push(dependency.name.clone()),
                ProvisionOutcome::AlreadyPresent => {
                    summary.already_present.push(dependency.name.clone())
                }
            }
        }

        summary.vocabulary_found = self.vocabulary_notice();

        println!("🗄️  Provisioning schemas...");
        let scripts = self.scripts();
        SchemaProvisioner::new(&scripts)
            .ensure_schemas(&self.config.connection.schemas())
            .await?;

        Ok(summary)
    }

    /// Prints the manual Athena download steps. Returns whether the configured
    /// vocabulary directory exists.
    fn vocabulary_notice(&self) -> bool {
        let vocab = self.resolve(&self.config.paths.athena_vocab);
        println!("📚 OMOP vocabularies must be downloaded manually:");
        println!("   1. Log in at {}", ATHENA_URL);
        println!("   2. Add the vocabularies you need (e.g. SNOMED, LOINC, RxNorm) to the cart");
        println!("   3. Download, accept the terms and unzip the archive");
        println!("   4. Point `paths.athena_vocab` at the unzipped directory");

        let found = vocab.is_dir();
        if found {
            println!("   ✅ Vocabulary directory found at {}", vocab.display());
        } else {
            println!(
                "   ⚠️  Warning: vocabulary directory not found at {}",
                vocab.display()
            );
            warn!(path = %vocab.display(), "Vocabulary directory missing");
        }
        found
    }

    // --- LOAD ---

    /// Fails with [`OmopflowError::Precondition`] unless both scripts and the
    /// reference directory exist.
    pub fn check_load_preconditions(&self) -> Result<(), OmopflowError> {
        let paths = &self.config.paths;
        let mut missing = Vec::new();
        for script in [&paths.init_script, &paths.etl_script] {
            if !self.resolve(script).is_file() {
                missing.push(script.display().to_string());
            }
        }
        if !self.resolve(&paths.concept_dir).is_dir() {
            missing.push(paths.concept_dir.display().to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(OmopflowError::Precondition {
                stage: Stage::Load,
                reason: format!("not found: {}", missing.join(", ")),
            })
        }
    }

    #[instrument(skip(self, connector))]
    pub async fn load(&self, connector: &dyn Connector) -> Result<LoadSummary, OmopflowError> {
        println!("🚀 Starting load...");
        let start = Instant::now();

        let summary = self
            .run_load(connector)
            .await
            .map_err(|e| e.in_stage(Stage::Load))?;

        println!(
            "🎉 Load finished in {:.2?}: {} reference tables, {} rows",
            start.elapsed(),
            summary.tables.len(),
            summary.total_rows()
        );
        Ok(summary)
    }

    async fn run_load(&self, connector: &dyn Connector) -> Result<LoadSummary, OmopflowError> {
        self.check_load_preconditions()?;
        let paths = &self.config.paths;
        let target = &self.config.connection.target_schema;
        let scripts = self.scripts();

        println!("🔧 Running {}...", paths.init_script.display());
        scripts.run(&ScriptInvocation::file(&paths.init_script)).await?;

        println!("📥 Loading reference tables into '{}'...", target);
        let summary = TabularLoader::new(
            connector,
            &self.config.loader,
            &self.config.connection.staging_schema,
        )
        .load_directory(&self.resolve(&paths.concept_dir), target)
        .await?;

        println!("⚙️  Running {}...", paths.etl_script.display());
        scripts
            .run(&ScriptInvocation::file(&paths.etl_script).var("OMOP_SCHEMA", target.as_str()))
            .await?;

        info!(tables = summary.tables.len(), "Load stage complete");
        Ok(summary)
    }

    // --- VALIDATE ---

    /// Runs the checks. A report with failures is still `Ok`; the caller
    /// decides what a failed report means.
    #[instrument(skip(self, connector))]
    pub async fn validate(
        &self,
        connector: &dyn Connector,
    ) -> Result<ValidationReport, OmopflowError> {
        let target = &self.config.connection.target_schema;
        self.run_validate(connector, target)
            .await
            .map_err(|e| e.in_stage(Stage::Validate))
    }

    async fn run_validate(
        &self,
        connector: &dyn Connector,
        schema: &str,
    ) -> Result<ValidationReport, OmopflowError> {
        if !connector.schema_exists(schema).await? {
            return Err(OmopflowError::Precondition {
                stage: Stage::Validate,
                reason: format!("schema '{}' does not exist", schema),
            });
        }
        ValidationSuite::new(connector, &self.config.validation)
            .run(schema)
            .await
    }

    // --- HELPERS ---

    fn scripts(&self) -> ScriptRunner<'_> {
        ScriptRunner::new(
            self.runner,
            &self.config.connection,
            &self.config.tools.psql,
            self.project_dir.clone(),
        )
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
