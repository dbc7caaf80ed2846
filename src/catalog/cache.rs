//! The cached, on-disk catalog index.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::source::collect_entries;
use super::CatalogIndex;
use crate::entry::CatalogEntry;
use crate::error::MtdataError;

/// Name of the cached index inside the cache directory.
pub const INDEX_FILE: &str = "mtdata.index.json";
/// Directory of user catalog sources inside the cache directory.
pub const SOURCES_DIR: &str = "catalog.d";

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: String,
    entries: Vec<CatalogEntry>,
}

/// Catalog index persisted in `<cache_dir>/mtdata.index.json`.
///
/// The index is built from the catalog sources on first access and reused
/// until it is invalidated or written by a different tool version.
#[derive(Debug)]
pub struct CachedCatalog {
    cache_dir: PathBuf,
    include_builtin: bool,
    entries: Option<Vec<CatalogEntry>>,
}

impl CachedCatalog {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            include_builtin: true,
            entries: None,
        }
    }

    /// Only index user sources.
    pub fn without_builtin(mut self) -> Self {
        self.include_builtin = false;
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.cache_dir.join(INDEX_FILE)
    }

    /// Where an invalidated index is moved to.
    pub fn backup_path(&self) -> PathBuf {
        self.index_path().with_extension("bak")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.cache_dir.join(SOURCES_DIR)
    }

    fn load_or_build(&self) -> Result<Vec<CatalogEntry>, MtdataError> {
        let index_path = self.index_path();
        if index_path.exists() {
            match read_index(&index_path) {
                Ok(index) if index.version == env!("CARGO_PKG_VERSION") => {
                    debug!("Loaded {} entries from {}", index.entries.len(), index_path.display());
                    return Ok(index.entries);
                }
                Ok(index) => info!(
                    "Index {} was built by version {}; rebuilding",
                    index_path.display(),
                    index.version
                ),
                Err(err) => warn!("Ignoring unreadable index {}: {err}", index_path.display()),
            }
        }

        let entries = collect_entries(self.include_builtin, &self.sources_dir())?;
        write_index(&self.cache_dir, &index_path, &entries)?;
        info!("Indexed {} entries into {}", entries.len(), index_path.display());
        Ok(entries)
    }
}

impl CatalogIndex for CachedCatalog {
    fn entries(&mut self) -> Result<&[CatalogEntry], MtdataError> {
        if self.entries.is_none() {
            self.entries = Some(self.load_or_build()?);
        }
        Ok(self.entries.as_deref().unwrap_or_default())
    }

    /// Move the index aside to `mtdata.index.bak`. Downloads are untouched.
    fn invalidate(&mut self) -> Result<(), MtdataError> {
        self.entries = None;
        let index_path = self.index_path();
        if index_path.exists() {
            let bak_path = self.backup_path();
            info!(
                "Invalidate index: {} -> {}",
                index_path.display(),
                bak_path.display()
            );
            fs::rename(&index_path, &bak_path)?;
        }
        Ok(())
    }
}

fn read_index(path: &Path) -> Result<IndexFile, MtdataError> {
    let file = File::open(path).map_err(MtdataError::Io)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| MtdataError::CatalogParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })
}

/// Write to a sibling temp file and rename, so readers never see a partial index.
fn write_index(
    cache_dir: &Path,
    path: &Path,
    entries: &[CatalogEntry],
) -> Result<(), MtdataError> {
    fs::create_dir_all(cache_dir)?;
    let tmp_path = path.with_extension("json.tmp");
    let index = IndexFile {
        version: env!("CARGO_PKG_VERSION").to_string(),
        entries: entries.to_vec(),
    };

    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    serde_json::to_writer(&mut writer, &index).map_err(|source| MtdataError::IndexWrite {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_source(cache_dir: &Path, name: &str, body: &str) {
        let dir = cache_dir.join(SOURCES_DIR);
        fs::create_dir_all(&dir).expect("create sources dir");
        fs::write(dir.join(name), body).expect("write source");
    }

    const ONE_ENTRY: &str = "entries:\n  - did: Local-toy-1-deu-eng\n    url: /data/toy.tsv\n";
    const TWO_ENTRIES: &str = "entries:\n  - did: Local-toy-1-deu-eng\n    url: /data/toy.tsv\n  - did: Local-toy-2-deu-eng\n    url: /data/toy2.tsv\n";

    #[test]
    fn first_access_builds_and_writes_index() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_source(temp.path(), "local.yaml", ONE_ENTRY);

        let mut catalog = CachedCatalog::new(temp.path()).without_builtin();
        assert_eq!(catalog.entries().expect("entries").len(), 1);
        assert!(temp.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn cached_index_is_reused_until_invalidated() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_source(temp.path(), "local.yaml", ONE_ENTRY);
        CachedCatalog::new(temp.path())
            .without_builtin()
            .entries()
            .expect("build");

        // New sources are not seen while the cached index is valid.
        write_source(temp.path(), "local.yaml", TWO_ENTRIES);
        let mut catalog = CachedCatalog::new(temp.path()).without_builtin();
        assert_eq!(catalog.entries().expect("entries").len(), 1);

        catalog.invalidate().expect("invalidate");
        assert_eq!(catalog.entries().expect("entries").len(), 2);
    }

    #[test]
    fn invalidate_renames_to_bak_and_keeps_downloads() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_source(temp.path(), "local.yaml", ONE_ENTRY);
        let download = temp.path().join("downloads/Local/toy-1/toy.tsv");
        fs::create_dir_all(download.parent().expect("parent")).expect("create downloads");
        fs::write(&download, "hallo\thello\n").expect("write download");

        let mut catalog = CachedCatalog::new(temp.path()).without_builtin();
        catalog.entries().expect("build");
        let index_body = fs::read_to_string(catalog.index_path()).expect("read index");

        catalog.invalidate().expect("invalidate");
        assert!(!catalog.index_path().exists());
        assert_eq!(
            catalog.backup_path(),
            temp.path().join("mtdata.index.bak")
        );
        assert_eq!(
            fs::read_to_string(catalog.backup_path()).expect("read bak"),
            index_body
        );
        assert_eq!(
            fs::read_to_string(&download).expect("download kept"),
            "hallo\thello\n"
        );
    }

    #[test]
    fn invalidate_without_index_is_a_no_op() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut catalog = CachedCatalog::new(temp.path()).without_builtin();
        catalog.invalidate().expect("invalidate");
        assert!(!catalog.backup_path().exists());
    }

    #[test]
    fn index_from_other_version_is_rebuilt() {
        let temp = tempfile::tempdir().expect("create temp dir");
        write_source(temp.path(), "local.yaml", ONE_ENTRY);
        fs::write(
            temp.path().join(INDEX_FILE),
            r#"{"version": "0.0.0-old", "entries": []}"#,
        )
        .expect("write stale index");

        let mut catalog = CachedCatalog::new(temp.path()).without_builtin();
        assert_eq!(catalog.entries().expect("entries").len(), 1);
    }
}
