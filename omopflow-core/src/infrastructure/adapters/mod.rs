// omopflow-core/src/infrastructure/adapters/mod.rs

pub mod postgres;
pub mod process;

pub use postgres::PostgresConnector;
pub use process::SystemProcessRunner;
