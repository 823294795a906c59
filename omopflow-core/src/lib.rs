// omopflow-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: contracts for the store and for external programs.
pub mod ports;

// 2. Domain: configuration model, naming rules, validation catalog, stages.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: Postgres and process adapters, config files, CSV.
pub mod infrastructure;

// 4. Application: setup, load and validate use cases.
pub mod application;

pub mod error;

pub use error::OmopflowError;
