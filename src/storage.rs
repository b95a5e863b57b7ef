//! Tabular persistence with two logical tables, "Posts" and "Comments".

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::TableRow;
use crate::summary::RunReport;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(rename = "Posts", default)]
    pub posts: Vec<TableRow>,
    #[serde(rename = "Comments", default)]
    pub comments: Vec<TableRow>,
}

impl Workbook {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.comments.is_empty()
    }

    pub fn extend(&mut self, other: &Workbook) {
        self.posts.extend_from_slice(&other.posts);
        self.comments.extend_from_slice(&other.comments);
    }

    pub fn clear(&mut self) {
        self.posts.clear();
        self.comments.clear();
    }
}

pub trait TabularStore {
    /// Merge `rows` with what is already stored and rewrite the primary file.
    fn append(&mut self, rows: &Workbook) -> Result<(), StorageError>;

    /// Timestamped copy of `rows`, separate from the primary file.
    fn write_backup(&self, rows: &Workbook) -> Result<PathBuf, StorageError>;

    fn write_summary(&self, report: &RunReport) -> Result<PathBuf, StorageError>;
}

/// `<dir>/<name>_data.json` holding `{"Posts": [...], "Comments": [...]}`.
#[derive(Debug, Clone)]
pub struct JsonWorkbookStore {
    dir: PathBuf,
    name: String,
}

impl JsonWorkbookStore {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(format!("{}_data.json", self.name))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(format!("{}_summary.json", self.name))
    }

    pub fn load(&self) -> Result<Workbook, StorageError> {
        let path = self.primary_path();
        if !path.exists() {
            return Ok(Workbook::default());
        }
        let raw = fs::read(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| StorageError::Json { path, source })
    }
}

impl TabularStore for JsonWorkbookStore {
    fn append(&mut self, rows: &Workbook) -> Result<(), StorageError> {
        let mut book = self.load()?;
        let before = (book.posts.len(), book.comments.len());
        book.extend(rows);
        write_json(&self.primary_path(), &book)?;
        debug!(
            "Workbook appended - path={}, posts={}->{}, comments={}->{}",
            self.primary_path().display(),
            before.0,
            book.posts.len(),
            before.1,
            book.comments.len()
        );
        Ok(())
    }

    fn write_backup(&self, rows: &Workbook) -> Result<PathBuf, StorageError> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self.dir.join(format!("{}_crash_backup_{}.json", self.name, stamp));
        write_json(&path, rows)?;
        info!(
            "Crash backup saved - path={}, posts={}, comments={}",
            path.display(),
            rows.posts.len(),
            rows.comments.len()
        );
        Ok(path)
    }

    fn write_summary(&self, report: &RunReport) -> Result<PathBuf, StorageError> {
        let path = self.summary_path();
        write_json(&path, report)?;
        Ok(path)
    }
}

/// Pretty JSON written to a sibling temp file, then renamed over `path`.
pub fn write_json<T: ?Sized + Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::comment;
    use pretty_assertions::assert_eq;

    fn book(ids: &[&str]) -> Workbook {
        Workbook {
            posts: Vec::new(),
            comments: ids
                .iter()
                .map(|id| TableRow::from(&comment(id, "Playtest", Some("fine"))))
                .collect(),
        }
    }

    #[test]
    fn append_merges_with_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonWorkbookStore::new(dir.path(), "blackmirror");
        store.append(&book(&["c1", "c2"])).unwrap();
        store.append(&book(&["c3"])).unwrap();

        let stored = store.load().unwrap();
        let ids: Vec<&str> = stored.comments.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert!(dir.path().join("blackmirror_data.json").is_file());
        assert!(!dir.path().join("blackmirror_data.json.tmp").exists());
    }

    #[test]
    fn workbook_uses_sheet_names() {
        let json = serde_json::to_value(book(&["c1"])).unwrap();
        assert!(json.get("Posts").is_some());
        assert_eq!(json["Comments"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn backup_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonWorkbookStore::new(dir.path(), "blackmirror");
        let path = store.write_backup(&book(&["c1"])).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("blackmirror_crash_backup_"));
        assert!(name.ends_with(".json"));
        // _YYYY-mm-dd_HH-MM-SS
        assert_eq!(name.len(), "blackmirror_crash_backup_".len() + 19 + ".json".len());
    }

    #[test]
    fn corrupt_primary_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x_data.json"), "[1,2").unwrap();
        let mut store = JsonWorkbookStore::new(dir.path(), "x");
        assert!(matches!(store.append(&book(&["c1"])), Err(StorageError::Json { .. })));
    }
}
