pub mod config;
pub mod error;
pub mod quoter;
pub mod script;
pub mod stage;
pub mod table;
pub mod validation;

pub use error::DomainError;
