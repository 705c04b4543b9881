//! Row files on local disk.

use scatterview_app::{RowSource, RowsFuture};
use scatterview_core::{CancellationToken, Row, SourceError};
use serde_json::Value;
use std::path::PathBuf;

/// Reads a JSON array of objects, or one JSON object per line.
///
/// Urls may carry a `file://` prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileRowSource;

impl RowSource for FileRowSource {
    fn fetch_rows(&self, url: &str, cancel: CancellationToken) -> RowsFuture {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        Box::pin(load_rows(path, cancel))
    }
}

async fn load_rows(path: PathBuf, cancel: CancellationToken) -> Result<Vec<Row>, SourceError> {
    cancel.check()?;
    let text = tokio::fs::read_to_string(&path).await?;
    cancel.check()?;
    parse_rows(&text, &cancel)
}

pub fn parse_rows(text: &str, cancel: &CancellationToken) -> Result<Vec<Row>, SourceError> {
    if text.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(text)?;
        return values
            .into_iter()
            .enumerate()
            .map(|(index, value)| into_row(value, index + 1, "Element"))
            .collect();
    }

    let mut rows = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        cancel.check()?;
        let value: Value = serde_json::from_str(line)?;
        rows.push(into_row(value, index + 1, "Line")?);
    }
    Ok(rows)
}

fn into_row(value: Value, position: usize, unit: &str) -> Result<Row, SourceError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(SourceError::Other(format!(
            "{unit} {position} is not a JSON object: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parses_json_array() {
        let rows = parse_rows(
            r#"[{"x": 1, "y": 2}, {"x": 3, "y": 4, "label": "b"}]"#,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["label"], "b");
    }

    #[test]
    fn test_parses_ndjson_skipping_blank_lines() {
        let text = "{\"x\": 1, \"y\": 2}\n\n   \n{\"x\": 3, \"y\": 4}\n";
        let rows = parse_rows(text, &CancellationToken::new()).unwrap();
        assert_eq!(rows.len(), 2);
        // Field order follows the file.
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_rejects_non_object_rows() {
        let err = parse_rows("{\"x\": 1}\n[1, 2]\n", &CancellationToken::new()).unwrap_err();
        assert_eq!(err.to_string(), "Other error: Line 2 is not a JSON object: [1,2]");

        let err = parse_rows("[{\"x\": 1}, 5]", &CancellationToken::new()).unwrap_err();
        assert!(err.to_string().contains("Element 2"));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = parse_rows("{\"x\": 1", &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_cancelled_parse_stops() {
        let token = CancellationToken::new();
        token.cancel();
        let err = parse_rows("{\"x\": 1}\n", &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_reads_file_with_and_without_scheme() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"x\": 1, \"y\": 2}}").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let rows = FileRowSource
            .fetch_rows(&path, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = FileRowSource
            .fetch_rows(&format!("file://{path}"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = FileRowSource
            .fetch_rows(&missing.to_string_lossy(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
