use std::path::{Path, PathBuf};

use common::error::AppError;
use serde_json::Value;
use tracing::info;

/// One raw input row. Ephemeral; discarded after chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Option<String>,
    pub text: String,
    /// Character count of the raw text, captured at load time for the
    /// quality filter and the EDA report.
    pub text_length: usize,
}

impl Record {
    pub fn new(id: Option<String>, text: String) -> Self {
        let text_length = text.chars().count();
        Self {
            id,
            text,
            text_length,
        }
    }
}

/// Loads records from a single `.json`/`.csv` file or from every such
/// file directly under a directory (non-recursive). Row order within a
/// file is preserved; files are visited in path order.
pub fn load_records(path: &str) -> Result<Vec<Record>, AppError> {
    let files = discover_files(Path::new(path))?;
    if files.is_empty() {
        return Err(AppError::DataLoad(format!(
            "no .json or .csv input files found at {path}"
        )));
    }

    let mut records = Vec::new();
    for file in &files {
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut parsed = match extension.as_str() {
            "json" => parse_json(file)?,
            "csv" => parse_csv(file)?,
            other => {
                return Err(AppError::DataLoad(format!(
                    "unsupported input format '{other}' for {}",
                    file.display()
                )))
            }
        };
        records.append(&mut parsed);
    }

    info!(files = files.len(), records = records.len(), "loaded input data");
    Ok(records)
}

fn discover_files(path: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !path.exists() {
        return Err(AppError::DataLoad(format!(
            "input path {} does not exist",
            path.display()
        )));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| {
                        let ext = ext.to_ascii_lowercase();
                        ext == "json" || ext == "csv"
                    })
        })
        .collect();
    files.sort();

    Ok(files)
}

fn parse_json(path: &Path) -> Result<Vec<Record>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::DataLoad(format!("invalid JSON in {}: {e}", path.display())))?;

    let rows = value.as_array().ok_or_else(|| {
        AppError::DataLoad(format!(
            "{} must contain a JSON array of objects",
            path.display()
        ))
    })?;

    let mut records = Vec::with_capacity(rows.len());
    let mut saw_text_key = false;
    for row in rows {
        let object = row
            .as_object()
            .ok_or_else(|| AppError::DataLoad(format!("non-object row in {}", path.display())))?;

        saw_text_key |= object.contains_key("text");

        // Rows with a missing or non-string text carry an empty text and
        // fall to the quality filter; only a file-wide absence of the
        // field is a load error.
        let text = object
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        records.push(Record::new(
            object.get("id").map(scalar_to_string),
            text.to_string(),
        ));
    }

    if !rows.is_empty() && !saw_text_key {
        return Err(AppError::DataLoad(format!(
            "no 'text' field in {}",
            path.display()
        )));
    }

    Ok(records)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_csv(path: &Path) -> Result<Vec<Record>, AppError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::DataLoad(format!("failed to read {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::DataLoad(format!("invalid CSV header in {}: {e}", path.display())))?
        .clone();

    let text_idx = headers.iter().position(|h| h == "text").ok_or_else(|| {
        AppError::DataLoad(format!("no 'text' column in {}", path.display()))
    })?;
    let id_idx = headers.iter().position(|h| h == "id");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row
            .map_err(|e| AppError::DataLoad(format!("invalid CSV row in {}: {e}", path.display())))?;

        let text = row.get(text_idx).unwrap_or_default().to_string();
        let id = id_idx
            .and_then(|idx| row.get(idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        records.push(Record::new(id, text));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create fixture");
        file.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn test_load_json_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(
            &dir,
            "data.json",
            r#"[{"id": 1, "text": "first row"}, {"text": "second row"}]"#,
        );

        let records = load_records(path.to_str().unwrap()).expect("load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("1"));
        assert_eq!(records[0].text, "first row");
        assert_eq!(records[0].text_length, 9);
        assert_eq!(records[1].id, None);
    }

    #[test]
    fn test_load_csv_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "data.csv", "id,text\n1,first row\n2,second row\n");

        let records = load_records(path.to_str().unwrap()).expect("load");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id.as_deref(), Some("2"));
        assert_eq!(records[1].text, "second row");
    }

    #[test]
    fn test_load_directory_concatenates_files() {
        let dir = TempDir::new().expect("tempdir");
        write_file(&dir, "a.json", r#"[{"text": "from json"}]"#);
        write_file(&dir, "b.csv", "text\nfrom csv\n");
        write_file(&dir, "ignored.txt", "not scanned");

        let records = load_records(dir.path().to_str().unwrap()).expect("load");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_text_field_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "data.json", r#"[{"id": 1, "body": "no text here"}]"#);

        let err = load_records(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }

    #[test]
    fn test_row_without_text_defaults_to_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(
            &dir,
            "data.json",
            r#"[{"id": 1, "text": "a valid row"}, {"id": 2, "body": "no text"}, {"id": 3, "text": 42}]"#,
        );

        let records = load_records(path.to_str().unwrap()).expect("load");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text, "a valid row");
        assert_eq!(records[1].text, "");
        assert_eq!(records[2].text, "");
    }

    #[test]
    fn test_missing_text_column_in_csv_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "data.csv", "id,body\n1,no text column\n");

        let err = load_records(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_records(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }

    #[test]
    fn test_nonexistent_path_fails() {
        let err = load_records("/definitely/not/here").unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }

    #[test]
    fn test_text_length_counts_characters_not_bytes() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "data.json", r#"[{"text": "тест"}]"#);

        let records = load_records(path.to_str().unwrap()).expect("load");
        assert_eq!(records[0].text_length, 4);
    }
}
