// omopflow-core/src/domain/stage.rs

use serde::Serialize;
use std::fmt;

/// The fixed, linear stages of a pipeline.
///
/// `Setup` and `Load` form a chain (`Setup -> Load -> Done`). `Validate` is
/// invoked on its own and assumes a previous `Load` completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Load,
    Validate,
}

impl Stage {
    /// The stage that follows this one in the provisioning chain.
    /// `None` means the chain is done.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Setup => Some(Stage::Load),
            Stage::Load => None,
            Stage::Validate => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Load => "load",
            Stage::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
