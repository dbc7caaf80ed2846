//! Catalog sources: the built-in list plus user files under `catalog.d/`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::entry::CatalogEntry;
use crate::error::MtdataError;

const BUILTIN_CATALOG: &str = include_str!("builtin.json");
const SOURCE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Deserialize)]
struct SourceFile {
    #[serde(default)]
    entries: Vec<CatalogEntry>,
}

/// Entries shipped inside the binary.
pub fn builtin_entries() -> Result<Vec<CatalogEntry>, MtdataError> {
    let parsed: SourceFile =
        serde_json::from_str(BUILTIN_CATALOG).map_err(|source| MtdataError::CatalogParse {
            path: PathBuf::from("<builtin>"),
            message: source.to_string(),
        })?;
    Ok(parsed.entries)
}

/// Read one JSON or YAML source file.
pub fn load_source(path: &Path) -> Result<Vec<CatalogEntry>, MtdataError> {
    let data = fs::read_to_string(path).map_err(MtdataError::Io)?;
    let parse_error = |message: String| MtdataError::CatalogParse {
        path: path.to_path_buf(),
        message,
    };

    let parsed: SourceFile = match extension(path).as_deref() {
        Some("json") => serde_json::from_str(&data).map_err(|e| parse_error(e.to_string()))?,
        _ => serde_yaml::from_str(&data).map_err(|e| parse_error(e.to_string()))?,
    };
    Ok(parsed.entries)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Source files under `dir`, sorted by path. A missing directory is empty.
fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, MtdataError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| MtdataError::CatalogParse {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;
        let is_source = extension(entry.path())
            .map(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_source {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Gather, validate and de-duplicate entries from every source.
pub fn collect_entries(
    include_builtin: bool,
    sources_dir: &Path,
) -> Result<Vec<CatalogEntry>, MtdataError> {
    let mut entries = if include_builtin {
        builtin_entries()?
    } else {
        Vec::new()
    };

    for path in discover_sources(sources_dir)? {
        let loaded = load_source(&path)?;
        debug!("{} entries from {}", loaded.len(), path.display());
        entries.extend(loaded);
    }

    let mut seen = HashSet::new();
    for entry in &entries {
        entry.validate()?;
        if !seen.insert(entry.did.clone()) {
            return Err(MtdataError::CatalogInvalid {
                did: entry.did.to_string(),
                message: "listed more than once".to_string(),
            });
        }
    }

    Ok(entries)
}
