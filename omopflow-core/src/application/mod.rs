// omopflow-core/src/application/mod.rs

pub mod loader;
pub mod pipeline;
pub mod prerequisites;
pub mod provisioning;
pub mod script;
pub mod validation;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write `use omopflow_core::application::PipelineOrchestrator;`
// without knowing the file layout.

pub use loader::{LoadSummary, LoadedTable, TabularLoader};
pub use pipeline::{PipelineOrchestrator, SetupSummary};
pub use prerequisites::check_prerequisites;
pub use provisioning::{DependencyProvisioner, ProvisionOutcome, SchemaProvisioner};
pub use script::ScriptRunner;
pub use validation::ValidationSuite;
