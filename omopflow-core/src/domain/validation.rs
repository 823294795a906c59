// omopflow-core/src/domain/validation.rs

use serde::Serialize;
use std::fmt;

/// Tables the transformation is expected to populate.
const POPULATED_TABLES: [&str; 17] = [
    "care_site",
    "person",
    "death",
    "visit_occurrence",
    "observation_period",
    "visit_detail",
    "procedure_occurrence",
    "provider",
    "condition_occurrence",
    "observation",
    "drug_exposure",
    "measurement",
    "specimen",
    "note",
    "note_nlp",
    "fact_relationship",
    "dose_era",
];

const PRIMARY_KEYS: [(&str, &str); 6] = [
    ("person", "person_id"),
    ("visit_occurrence", "visit_occurrence_id"),
    ("condition_occurrence", "condition_occurrence_id"),
    ("drug_exposure", "drug_exposure_id"),
    ("measurement", "measurement_id"),
    ("observation", "observation_id"),
];

/// The fixed set of checks evaluated by `validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCatalog {
    pub tables: Vec<String>,
    /// (table, primary key column)
    pub primary_keys: Vec<(String, String)>,
}

impl Default for ValidationCatalog {
    fn default() -> Self {
        Self {
            tables: POPULATED_TABLES.iter().map(|t| t.to_string()).collect(),
            primary_keys: PRIMARY_KEYS
                .iter()
                .map(|(t, c)| (t.to_string(), c.to_string()))
                .collect(),
        }
    }
}

impl ValidationCatalog {
    /// Existence checks first, then row counts, then primary-key null checks.
    pub fn checks(&self) -> Vec<ValidationCheck> {
        let existence = self.tables.iter().map(|t| ValidationCheck {
            table: t.clone(),
            kind: CheckKind::Existence,
        });
        let row_counts = self.tables.iter().map(|t| ValidationCheck {
            table: t.clone(),
            kind: CheckKind::RowCount,
        });
        let primary_keys = self.primary_keys.iter().map(|(t, c)| ValidationCheck {
            table: t.clone(),
            kind: CheckKind::PrimaryKeyNull { column: c.clone() },
        });
        existence.chain(row_counts).chain(primary_keys).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckKind {
    Existence,
    RowCount,
    PrimaryKeyNull { column: String },
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Existence => f.write_str("existence"),
            CheckKind::RowCount => f.write_str("row count"),
            CheckKind::PrimaryKeyNull { column } => write!(f, "pk null ({})", column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCheck {
    pub table: String,
    #[serde(flatten)]
    pub kind: CheckKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Pass,
    /// Reported, never fails the run.
    Warning,
    /// Hard failure.
    Fail,
    /// Not evaluated because the table is missing.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    #[serde(flatten)]
    pub check: ValidationCheck,
    pub outcome: CheckOutcome,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub schema: String,
    pub results: Vec<CheckResult>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ValidationReport {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, check: ValidationCheck, outcome: CheckOutcome, detail: String) {
        self.results.push(CheckResult {
            check,
            outcome,
            detail,
        });
    }

    /// False as soon as one check failed hard. Warnings do not count.
    pub fn passed(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| r.outcome == CheckOutcome::Fail)
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.results
            .iter()
            .fold(OutcomeCounts::default(), |mut acc, r| {
                match r.outcome {
                    CheckOutcome::Pass => acc.passed += 1,
                    CheckOutcome::Warning => acc.warnings += 1,
                    CheckOutcome::Fail => acc.failed += 1,
                    CheckOutcome::Skipped => acc.skipped += 1,
                }
                acc
            })
    }

    pub fn missing_tables(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.check.kind == CheckKind::Existence && r.outcome == CheckOutcome::Fail)
            .map(|r| r.check.table.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            schema: &'a str,
            passed: bool,
            counts: OutcomeCounts,
            results: &'a [CheckResult],
        }

        serde_json::to_string_pretty(&JsonReport {
            schema: &self.schema,
            passed: self.passed(),
            counts: self.counts(),
            results: &self.results,
        })
    }
}
