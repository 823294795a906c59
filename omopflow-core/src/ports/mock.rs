// omopflow-core/src/ports/mock.rs
//
// In-memory port implementations shared by the use-case tests.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::OmopflowError;
use crate::ports::connector::Connector;
use crate::ports::process::{CommandSpec, ProcessOutput, ProcessRunner};

/// Driver-level failure as a real connector would surface it.
fn failure(message: String) -> OmopflowError {
    std::io::Error::other(message).into()
}

// --- MOCK CONNECTOR ---
#[derive(Clone, Default)]
pub struct MockConnector {
    pub executed_queries: Arc<Mutex<Vec<String>>>,
    /// schema -> tables
    pub tables: HashMap<String, Vec<String>>,
    /// exact query -> scalar, or an error message
    pub scalars: HashMap<String, Result<i64, String>>,
    /// `execute` fails for any statement containing this text
    pub fail_on: Option<String>,
    pub list_tables_error: Option<String>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(schema: &str, tables: &[&str]) -> Self {
        let mut mock = Self::new();
        mock.tables.insert(
            schema.to_string(),
            tables.iter().map(|t| t.to_string()).collect(),
        );
        mock
    }

    pub fn scalar(mut self, query: &str, value: i64) -> Self {
        self.scalars.insert(query.to_string(), Ok(value));
        self
    }

    pub fn scalar_error(mut self, query: &str, message: &str) -> Self {
        self.scalars
            .insert(query.to_string(), Err(message.to_string()));
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.executed_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn execute(&self, query: &str) -> Result<(), OmopflowError> {
        self.executed_queries
            .lock()
            .unwrap()
            .push(query.to_string());
        match &self.fail_on {
            Some(fragment) if query.contains(fragment.as_str()) => {
                Err(failure(format!("mock failure on: {}", query)))
            }
            _ => Ok(()),
        }
    }

    async fn query_scalar(&self, query: &str) -> Result<i64, OmopflowError> {
        self.executed_queries
            .lock()
            .unwrap()
            .push(query.to_string());
        match self.scalars.get(query) {
            Some(Ok(v)) => Ok(*v),
            Some(Err(msg)) => Err(failure(msg.clone())),
            None => Err(failure(format!("relation does not exist: {}", query))),
        }
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, OmopflowError> {
        if let Some(msg) = &self.list_tables_error {
            return Err(failure(msg.clone()));
        }
        Ok(self.tables.get(schema).cloned().unwrap_or_default())
    }

    async fn schema_exists(&self, schema: &str) -> Result<bool, OmopflowError> {
        Ok(self.tables.contains_key(schema))
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}

// --- MOCK PROCESS RUNNER ---
#[derive(Clone)]
pub enum MockResponse {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    NotFound,
}

impl MockResponse {
    pub fn ok(stdout: &str) -> Self {
        MockResponse::Exit {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        MockResponse::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Succeeds with empty output unless a response is registered for the
/// program name.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    pub commands: Arc<Mutex<Vec<CommandSpec>>>,
    pub responses: HashMap<String, MockResponse>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, program: &str, response: MockResponse) -> Self {
        self.responses.insert(program.to_string(), response);
        self
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, OmopflowError> {
        self.commands.lock().unwrap().push(command.clone());
        match self.responses.get(&command.program) {
            None => Ok(ProcessOutput {
                code: Some(0),
                ..Default::default()
            }),
            Some(MockResponse::Exit {
                code,
                stdout,
                stderr,
            }) => Ok(ProcessOutput {
                code: Some(*code),
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            }),
            Some(MockResponse::NotFound) => Err(OmopflowError::Infrastructure(
                crate::infrastructure::error::InfrastructureError::ProcessSpawn {
                    program: command.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                },
            )),
        }
    }
}
