// src/storage.rs

use crate::error::{CatalogLoadError, ProgressLoadError, StorageError};
use crate::models::{Problem, ProgressRecord};
use log::{debug, info};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The two flat JSON files behind the tracker. Every save overwrites the
/// whole file; the last write wins.
#[derive(Debug, Clone)]
pub struct JsonStore {
    catalog_path: PathBuf,
    progress_path: PathBuf,
}

impl JsonStore {
    pub fn new(catalog_path: impl Into<PathBuf>, progress_path: impl Into<PathBuf>) -> Self {
        JsonStore {
            catalog_path: catalog_path.into(),
            progress_path: progress_path.into(),
        }
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    pub fn load_catalog(&self) -> Result<Vec<Problem>, CatalogLoadError> {
        let path = &self.catalog_path;
        let data = fs::read_to_string(path).map_err(|source| CatalogLoadError::Read {
            path: path.clone(),
            source,
        })?;
        let problems: Vec<Problem> = serde_json::from_str(&null_non_finite(&data))
            .map_err(|source| CatalogLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        validate_ids(&problems)?;
        info!("[Storage] Loaded {} problems from {:?}", problems.len(), path);
        Ok(problems)
    }

    pub fn save_catalog(&self, problems: &[Problem]) -> Result<(), StorageError> {
        write_json(&self.catalog_path, problems)?;
        debug!("[Storage] Catalog written ({} problems)", problems.len());
        Ok(())
    }

    pub fn load_progress(&self) -> Result<ProgressRecord, ProgressLoadError> {
        let path = &self.progress_path;
        let data = match fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProgressLoadError::Missing(path.clone()))
            }
            Err(source) => {
                return Err(ProgressLoadError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };
        let record: ProgressRecord = serde_json::from_str(&null_non_finite(&data))
            .map_err(|source| ProgressLoadError::Parse {
                path: path.clone(),
                source,
            })?;
        info!(
            "[Storage] Loaded progress from {:?} ({} ledger entries)",
            path,
            record.problems.len()
        );
        Ok(record)
    }

    /// Copies the progress file to `<name>.corrupt` so the next save does
    /// not destroy the only copy.
    pub fn back_up_progress(&self) -> Result<PathBuf, StorageError> {
        let mut name = self.progress_path.as_os_str().to_os_string();
        name.push(".corrupt");
        let backup = PathBuf::from(name);
        fs::copy(&self.progress_path, &backup).map_err(|source| StorageError::Backup {
            path: backup.clone(),
            source,
        })?;
        info!("[Storage] Unreadable progress kept at {:?}", backup);
        Ok(backup)
    }

    pub fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        write_json(&self.progress_path, record)?;
        debug!("[Storage] Progress written");
        Ok(())
    }
}

fn validate_ids(problems: &[Problem]) -> Result<(), CatalogLoadError> {
    let mut seen = HashSet::with_capacity(problems.len());
    for (index, p) in problems.iter().enumerate() {
        if p.id.trim().is_empty() {
            return Err(CatalogLoadError::MissingId { index });
        }
        if !seen.insert(p.id.as_str()) {
            return Err(CatalogLoadError::DuplicateId(p.id.clone()));
        }
    }
    Ok(())
}

/// Catalogs exported from pandas carry bare `NaN`/`Infinity` for empty
/// cells. Those tokens become `null`; string contents are left alone.
fn null_non_finite(data: &str) -> Cow<'_, str> {
    if !data.contains("NaN") && !data.contains("Infinity") {
        return Cow::Borrowed(data);
    }

    let mut out = String::with_capacity(data.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = data;
    while let Some(c) = rest.chars().next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })
}
