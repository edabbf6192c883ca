//! Loads pre-extracted records from disk for batch ingestion.
//!
//! A record is `{content, source, metadata?, embedding}`, the payload the
//! extraction collaborators hand to the store. Supported files:
//! - `*.jsonl`: one record per line, blank lines ignored
//! - `*.json`: a single record or an array of records
//!
//! A record that fails to parse is reported with its location and skipped;
//! the rest of the file still loads.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::NewDocument;

/// Position of a record inside its file: line for `.jsonl`, array slot
/// (1-based) for `.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub path: PathBuf,
    pub entry: usize,
}

impl std::fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.entry)
    }
}

#[derive(Debug, Clone)]
pub struct RejectedRecord {
    pub location: RecordLocation,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<(RecordLocation, NewDocument)>,
    pub rejected: Vec<RejectedRecord>,
}

impl LoadedRecords {
    fn extend(&mut self, other: LoadedRecords) {
        self.records.extend(other.records);
        self.rejected.extend(other.rejected);
    }
}

#[derive(Default)]
pub struct RecordLoader;

impl RecordLoader {
    pub fn new() -> Self { Self }

    pub fn load_directory(&self, data_dir: &Path) -> Result<LoadedRecords> {
        self.load_directory_limited(data_dir, usize::MAX)
    }

    /// Load at most `limit` files, in path order.
    pub fn load_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<LoadedRecords> {
        let mut files = self.list_record_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .json or .jsonl files found");
            return Ok(LoadedRecords::default());
        }
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited to first files");
        }
        let mut loaded = LoadedRecords::default();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), "loading record file");
            loaded.extend(self.load_file(file_path)?);
        }
        tracing::info!(
            files = files.len(),
            records = loaded.records.len(),
            rejected = loaded.rejected.len(),
            "loaded record files"
        );
        Ok(loaded)
    }

    pub fn load_file(&self, path: &Path) -> Result<LoadedRecords> {
        let text = fs::read_to_string(path).map_err(|e| Error::storage(format!("read {}", path.display()), e))?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => Ok(parse_lines(path, &text)),
            Some("json") => Ok(parse_json(path, &text)),
            _ => Err(Error::validation(format!("unsupported record file {}", path.display()))),
        }
    }

    fn list_record_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut record_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if matches!(path.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                record_files.push(path.to_path_buf());
            }
        }
        record_files.sort();
        record_files
    }
}

fn parse_lines(path: &Path, text: &str) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        let location = RecordLocation { path: path.to_path_buf(), entry: i + 1 };
        match serde_json::from_str::<NewDocument>(line) {
            Ok(record) => loaded.records.push((location, record)),
            Err(e) => loaded.rejected.push(RejectedRecord { location, reason: e.to_string() }),
        }
    }
    loaded
}

fn parse_json(path: &Path, text: &str) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    let values = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(value) => vec![value],
        Err(e) => {
            let location = RecordLocation { path: path.to_path_buf(), entry: 1 };
            loaded.rejected.push(RejectedRecord { location, reason: e.to_string() });
            return loaded;
        }
    };
    for (i, value) in values.into_iter().enumerate() {
        let location = RecordLocation { path: path.to_path_buf(), entry: i + 1 };
        match serde_json::from_value::<NewDocument>(value) {
            Ok(record) => loaded.records.push((location, record)),
            Err(e) => loaded.rejected.push(RejectedRecord { location, reason: e.to_string() }),
        }
    }
    loaded
}
