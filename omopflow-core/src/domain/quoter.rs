// omopflow-core/src/domain/quoter.rs

use regex::Regex;
use sqlparser::ast::Ident;
use std::sync::OnceLock;

use crate::domain::error::DomainError;

fn re_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|_| {
            // Hardcoded pattern; fall back to a regex that never matches.
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

/// Schema, sequence and column names coming from configuration must be plain
/// identifiers. Table names derived from files are quoted instead.
pub fn validate_identifier(name: &str) -> Result<(), DomainError> {
    if name.len() <= 63 && re_identifier().is_match(name) {
        Ok(())
    } else {
        Err(DomainError::InvalidIdentifier(name.to_string()))
    }
}

/// `name` -> `"name"`, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    Ident::with_quote('"', name).to_string()
}

/// `"schema"."name"`
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// String literal with single quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
