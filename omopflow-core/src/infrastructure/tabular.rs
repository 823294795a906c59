// omopflow-core/src/infrastructure/tabular.rs

use csv::{ReaderBuilder, Trim};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::domain::table::TabularData;
use crate::error::OmopflowError;
use crate::infrastructure::error::InfrastructureError;

/// Reads a comma-separated file: `#` comment lines skipped, quotes honoured
/// (also after blanks, as in `IV, "a, b"`), fields trimmed, empty fields as
/// NULL, headers lower-cased.
pub fn read_tabular_file(path: &Path) -> Result<TabularData, OmopflowError> {
    let csv_error = |source: csv::Error| InfrastructureError::Csv {
        path: path.display().to_string(),
        source,
    };

    let raw = fs::read(path).map_err(|e| csv_error(e.into()))?;
    let content = skip_space_before_quotes(&raw);

    let mut reader = ReaderBuilder::new()
        .comment(Some(b'#'))
        .quote(b'"')
        .trim(Trim::All)
        .from_reader(content.as_slice());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }

    debug!(path = ?path, columns = headers.len(), rows = rows.len(), "Parsed tabular file");
    Ok(TabularData::new(&path.display().to_string(), headers, rows)?)
}

/// Drops the blanks between a field boundary and an opening quote, so the
/// quote starts the field. Quoted content and `#` comment lines pass through
/// untouched.
fn skip_space_before_quotes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line_start = true;
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];

        if in_quotes {
            out.push(byte);
            if byte == b'"' {
                if input.get(i + 1) == Some(&b'"') {
                    out.push(b'"');
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
            i += 1;
            continue;
        }

        if line_start && byte == b'#' {
            let end = input[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(input.len(), |p| i + p + 1);
            out.extend_from_slice(&input[i..end]);
            i = end;
            continue;
        }

        if field_start && matches!(byte, b' ' | b'\t') {
            let rest = &input[i..];
            let blanks = rest.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
            if rest.get(blanks) != Some(&b'"') {
                out.extend_from_slice(&rest[..blanks]);
                field_start = false;
                line_start = false;
            }
            i += blanks;
            continue;
        }

        match byte {
            b'"' if field_start => in_quotes = true,
            b',' => field_start = true,
            b'\n' => {
                field_start = true;
                line_start = true;
            }
            _ => field_start = false,
        }
        if byte != b'\n' {
            line_start = false;
        }
        out.push(byte);
        i += 1;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_comments_quotes_and_headers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("Route.csv");
        fs::write(
            &path,
            "# generated mapping\nRoute_Code, Concept_Name ,Concept_ID\n# inline note\nIV, \"Intravenous, bolus\", 4171047\nPO,,\n",
        )?;

        let data = read_tabular_file(&path)?;

        assert_eq!(data.columns, vec!["route_code", "concept_name", "concept_id"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(
            data.rows[0],
            vec![
                Some("IV".to_string()),
                Some("Intravenous, bolus".to_string()),
                Some("4171047".to_string())
            ]
        );
        assert_eq!(data.rows[1], vec![Some("PO".to_string()), None, None]);
        Ok(())
    }

    #[test]
    fn test_quoted_field_after_blank_keeps_embedded_comma() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("route.csv");
        fs::write(&path, "code,label,note\nIV, \"Intravenous, bolus\"\n")?;

        let data = read_tabular_file(&path)?;

        assert_eq!(data.rows.len(), 1);
        assert_eq!(
            data.rows[0][1].as_deref(),
            Some("Intravenous, bolus"),
            "row: {:?}",
            data.rows[0]
        );
        Ok(())
    }

    #[test]
    fn test_skip_space_before_quotes() {
        let cases: [(&str, &str); 5] = [
            ("a, \"b, c\"\n", "a,\"b, c\"\n"),
            ("  \"x\",y\n", "\"x\",y\n"),
            ("a, b\n", "a, b\n"),
            ("\"say \"\" , \"\"\", \"z\"\n", "\"say \"\" , \"\"\",\"z\"\n"),
            ("# note, \"open\na, \"b\"\n", "# note, \"open\na,\"b\"\n"),
        ];
        for (input, expected) in cases {
            let out = skip_space_before_quotes(input.as_bytes());
            assert_eq!(String::from_utf8(out).unwrap(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_file_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, "")?;

        let err = read_tabular_file(&path).unwrap_err();
        assert!(matches!(
            err,
            OmopflowError::Domain(DomainError::EmptySource(_))
        ));
        Ok(())
    }

    #[test]
    fn test_ragged_row_is_csv_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "a,b\n1,2,3\n")?;

        let err = read_tabular_file(&path).unwrap_err();
        assert!(matches!(
            err,
            OmopflowError::Infrastructure(InfrastructureError::Csv { .. })
        ));
        Ok(())
    }
}
