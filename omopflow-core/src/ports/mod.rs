// omopflow-core/src/ports/mod.rs

pub mod connector;
pub mod process;

#[cfg(test)]
pub(crate) mod mock;

pub use connector::Connector;
pub use process::{CommandSpec, ProcessOutput, ProcessRunner};
