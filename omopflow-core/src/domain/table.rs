// omopflow-core/src/domain/table.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::quoter::{qualified, quote_ident, quote_literal};

/// Where one tabular source file ends up.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub source: PathBuf,
    pub table: String,
    pub schema: String,
}

impl TableSpec {
    pub fn from_path(source: &Path, prefix: &str, schema: &str) -> Result<Self, DomainError> {
        Ok(Self {
            source: source.to_path_buf(),
            table: derive_table_name(source, prefix)?,
            schema: schema.to_string(),
        })
    }

    pub fn qualified_name(&self) -> String {
        qualified(&self.schema, &self.table)
    }
}

/// `<prefix>_<lower-cased file stem>`, e.g. `Admissions.csv` -> `gcpt_admissions`.
pub fn derive_table_name(source: &Path, prefix: &str) -> Result<String, DomainError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DomainError::InvalidSourceFile(source.display().to_string()))?;
    Ok(format!("{}_{}", prefix, stem.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Text,
}

impl ColumnType {
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            ColumnType::BigInt => value.parse::<i64>().is_ok(),
            // "NaN" and "inf" parse as f64 but are not SQL numeric literals.
            ColumnType::Double => value.parse::<f64>().is_ok_and(f64::is_finite),
            ColumnType::Text => true,
        }
    }
}

/// Parsed contents of one tabular file. `None` cells are NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TabularData {
    /// Lower-cases headers and rejects duplicates.
    pub fn new(
        source_name: &str,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, DomainError> {
        if headers.is_empty() {
            return Err(DomainError::EmptySource(source_name.to_string()));
        }

        let columns: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DomainError::DuplicateColumn {
                    source_name: source_name.to_string(),
                    column: column.clone(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Narrowest type accepting every non-null value; all-null columns are TEXT.
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|idx| {
                let mut values = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx).and_then(|v| v.as_deref()))
                    .peekable();
                if values.peek().is_none() {
                    return ColumnType::Text;
                }

                let values: Vec<&str> = values.collect();
                [ColumnType::BigInt, ColumnType::Double]
                    .into_iter()
                    .find(|ty| values.iter().all(|v| ty.accepts(v)))
                    .unwrap_or(ColumnType::Text)
            })
            .collect()
    }

    pub fn create_table_sql(&self, table: &str, types: &[ColumnType]) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .zip(types)
            .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql()))
            .collect();
        format!("CREATE TABLE {} ({})", table, columns.join(", "))
    }

    /// Multi-row INSERT statements of at most `batch_size` rows each.
    pub fn insert_statements(
        &self,
        table: &str,
        types: &[ColumnType],
        batch_size: usize,
    ) -> Vec<String> {
        let column_list: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let column_list = column_list.join(", ");

        self.rows
            .chunks(batch_size.max(1))
            .map(|chunk| {
                let tuples: Vec<String> = chunk
                    .iter()
                    .map(|row| {
                        let values: Vec<String> = types
                            .iter()
                            .enumerate()
                            .map(|(idx, ty)| render_value(row.get(idx).and_then(|v| v.as_deref()), *ty))
                            .collect();
                        format!("({})", values.join(", "))
                    })
                    .collect();
                format!(
                    "INSERT INTO {} ({}) VALUES {}",
                    table,
                    column_list,
                    tuples.join(", ")
                )
            })
            .collect()
    }
}

fn render_value(value: Option<&str>, ty: ColumnType) -> String {
    match (value, ty) {
        (None, _) => "NULL".to_string(),
        // Types were inferred from these very values, so numbers are safe to inline.
        (Some(v), ColumnType::BigInt | ColumnType::Double) => v.to_string(),
        (Some(v), ColumnType::Text) => quote_literal(v),
    }
}
