// omopflow-core/src/application/validation.rs

use std::collections::HashMap;
use tracing::{debug, instrument, warn};

use crate::domain::quoter::{qualified, quote_ident};
use crate::domain::validation::{
    CheckKind, CheckOutcome, ValidationCatalog, ValidationCheck, ValidationReport,
};
use crate::error::OmopflowError;
use crate::ports::connector::Connector;

/// Read-only post-load checks against the target schema.
pub struct ValidationSuite<'a> {
    connector: &'a dyn Connector,
    catalog: &'a ValidationCatalog,
}

impl<'a> ValidationSuite<'a> {
    pub fn new(connector: &'a dyn Connector, catalog: &'a ValidationCatalog) -> Self {
        Self { connector, catalog }
    }

    /// Evaluates every catalog check. Only an uninspectable schema is an
    /// error; individual check failures land in the report.
    #[instrument(skip(self), fields(engine = self.connector.engine_name()))]
    pub async fn run(&self, schema: &str) -> Result<ValidationReport, OmopflowError> {
        // Lower-cased name -> name as stored; queries use the stored name.
        let present: HashMap<String, String> = self
            .connector
            .list_tables(schema)
            .await?
            .into_iter()
            .map(|t| (t.to_lowercase(), t))
            .collect();
        debug!(tables = present.len(), "Listed tables");

        let mut report = ValidationReport::new(schema);
        for check in self.catalog.checks() {
            let stored = present.get(&check.table.to_lowercase()).map(String::as_str);
            let (outcome, detail) = self.evaluate(schema, &check, stored).await;
            if outcome == CheckOutcome::Fail {
                warn!(table = %check.table, check = %check.kind, %detail, "Check failed");
            }
            report.record(check, outcome, detail);
        }
        Ok(report)
    }

    async fn evaluate(
        &self,
        schema: &str,
        check: &ValidationCheck,
        stored: Option<&str>,
    ) -> (CheckOutcome, String) {
        let Some(table) = stored else {
            return match check.kind {
                CheckKind::Existence => (CheckOutcome::Fail, "table missing".to_string()),
                _ => (CheckOutcome::Skipped, "table missing".to_string()),
            };
        };

        match &check.kind {
            CheckKind::Existence => (CheckOutcome::Pass, "present".to_string()),

            CheckKind::RowCount => {
                match self
                    .connector
                    .query_scalar(&row_count_query(schema, table))
                    .await
                {
                    Ok(0) => (CheckOutcome::Warning, "0 rows".to_string()),
                    Ok(n) => (CheckOutcome::Pass, format!("{} rows", n)),
                    Err(e) => (CheckOutcome::Fail, e.to_string()),
                }
            }

            CheckKind::PrimaryKeyNull { column } => {
                match self
                    .connector
                    .query_scalar(&null_count_query(schema, table, column))
                    .await
                {
                    Ok(0) => (CheckOutcome::Pass, "no nulls".to_string()),
                    Ok(n) => (CheckOutcome::Fail, format!("{} null values", n)),
                    Err(e) => (CheckOutcome::Fail, e.to_string()),
                }
            }
        }
    }
}

pub(crate) fn row_count_query(schema: &str, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", qualified(schema, table))
}

pub(crate) fn null_count_query(schema: &str, table: &str, column: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
        qualified(schema, table),
        quote_ident(column)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::error::InfrastructureError;
    use crate::ports::mock::MockConnector;

    /// Every catalog table present with 10 rows and clean keys.
    fn healthy(catalog: &ValidationCatalog) -> MockConnector {
        let tables: Vec<&str> = catalog.tables.iter().map(String::as_str).collect();
        let mut mock = MockConnector::with_tables("omop", &tables);
        for table in &catalog.tables {
            mock = mock.scalar(&row_count_query("omop", table), 10);
        }
        for (table, column) in &catalog.primary_keys {
            mock = mock.scalar(&null_count_query("omop", table, column), 0);
        }
        mock
    }

    fn outcome_of(report: &ValidationReport, table: &str, kind: &CheckKind) -> CheckOutcome {
        report
            .results
            .iter()
            .find(|r| r.check.table == table && &r.check.kind == kind)
            .map(|r| r.outcome)
            .unwrap()
    }

    #[test]
    fn test_queries_are_quoted() {
        assert_eq!(
            row_count_query("omop", "person"),
            "SELECT COUNT(*) FROM \"omop\".\"person\""
        );
        assert_eq!(
            null_count_query("omop", "person", "person_id"),
            "SELECT COUNT(*) FROM \"omop\".\"person\" WHERE \"person_id\" IS NULL"
        );
    }

    #[tokio::test]
    async fn test_healthy_schema_passes() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let connector = healthy(&catalog);

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(report.passed());
        let counts = report.counts();
        assert_eq!(counts.passed, 17 + 17 + 6);
        assert_eq!(counts.failed + counts.warnings + counts.skipped, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_table_fails_and_skips_dependents() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let mut connector = healthy(&catalog);
        connector
            .tables
            .get_mut("omop")
            .unwrap()
            .retain(|t| t != "person");

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(!report.passed());
        assert_eq!(report.missing_tables(), vec!["person"]);
        assert_eq!(
            outcome_of(&report, "person", &CheckKind::RowCount),
            CheckOutcome::Skipped
        );
        assert_eq!(
            outcome_of(
                &report,
                "person",
                &CheckKind::PrimaryKeyNull {
                    column: "person_id".to_string()
                }
            ),
            CheckOutcome::Skipped
        );
        assert!(
            !connector
                .queries()
                .iter()
                .any(|q| q.contains("\"omop\".\"person\""))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_table_is_only_a_warning() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let connector = healthy(&catalog).scalar(&row_count_query("omop", "drug_exposure"), 0);

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(report.passed());
        assert_eq!(
            outcome_of(&report, "drug_exposure", &CheckKind::RowCount),
            CheckOutcome::Warning
        );
        assert_eq!(report.counts().warnings, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_null_primary_key_fails() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let connector = healthy(&catalog).scalar(&null_count_query("omop", "person", "person_id"), 3);

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(!report.passed());
        let result = report
            .results
            .iter()
            .find(|r| r.outcome == CheckOutcome::Fail)
            .unwrap();
        assert_eq!(result.check.table, "person");
        assert_eq!(result.detail, "3 null values");
        Ok(())
    }

    #[tokio::test]
    async fn test_query_error_is_a_failure_not_an_abort() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let connector = healthy(&catalog)
            .scalar_error(&row_count_query("omop", "note"), "permission denied for table note");

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(!report.passed());
        assert_eq!(report.counts().failed, 1);
        assert_eq!(
            outcome_of(&report, "note", &CheckKind::RowCount),
            CheckOutcome::Fail
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_mixed_case_catalog_queries_listed_name() -> anyhow::Result<()> {
        let catalog = ValidationCatalog {
            tables: vec!["Person".to_string()],
            primary_keys: vec![("Person".to_string(), "person_id".to_string())],
        };
        let connector = MockConnector::with_tables("omop", &["person"])
            .scalar(&row_count_query("omop", "person"), 5)
            .scalar(&null_count_query("omop", "person", "person_id"), 0);

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert!(report.passed(), "{:?}", report.results);
        assert_eq!(report.counts().passed, 3);
        assert_eq!(report.results[0].check.table, "Person");
        Ok(())
    }

    #[tokio::test]
    async fn test_unlistable_schema_is_fatal() {
        let catalog = ValidationCatalog::default();
        let mut connector = healthy(&catalog);
        connector.list_tables_error = Some("connection reset".to_string());

        let err = ValidationSuite::new(&connector, &catalog)
            .run("omop")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OmopflowError::Infrastructure(InfrastructureError::Io(_))
        ));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_report_order_follows_catalog() -> anyhow::Result<()> {
        let catalog = ValidationCatalog::default();
        let connector = healthy(&catalog);

        let report = ValidationSuite::new(&connector, &catalog).run("omop").await?;

        assert_eq!(report.results.len(), catalog.checks().len());
        assert_eq!(report.results[0].check.table, "care_site");
        assert_eq!(report.results[0].check.kind, CheckKind::Existence);
        assert!(matches!(
            report.results.last().unwrap().check.kind,
            CheckKind::PrimaryKeyNull { .. }
        ));
        Ok(())
    }
}
