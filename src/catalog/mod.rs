//! The catalog index of known datasets.
//!
//! Commands never reach for a global index: they are handed something that
//! implements [`CatalogIndex`]. The on-disk [`CachedCatalog`] is what the CLI
//! uses; [`StaticCatalog`] holds entries in memory.

mod cache;
mod source;

pub use cache::{CachedCatalog, INDEX_FILE, SOURCES_DIR};
pub use source::{builtin_entries, collect_entries, load_source};

use crate::entry::{CatalogEntry, DatasetId};
use crate::error::MtdataError;
use crate::lang::LangPair;

/// Filters for [`CatalogIndex::lookup_entries`].
#[derive(Clone, Debug, Default)]
pub struct EntryQuery {
    /// Matches entries with these languages, in either direction.
    pub langs: Option<LangPair>,
    /// Keep entries matching any of these names.
    pub names: Option<Vec<String>>,
    /// Drop entries matching any of these names.
    pub not_names: Option<Vec<String>>,
    /// Case-insensitive substring matching against the name or the full id.
    pub fuzzy: bool,
}

impl EntryQuery {
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(langs) = &self.langs {
            if !langs.is_compatible(entry.langs()) {
                return false;
            }
        }

        if let Some(names) = self.names.as_deref().filter(|n| !n.is_empty()) {
            if !names.iter().any(|name| name_matches(entry, name, self.fuzzy)) {
                return false;
            }
        }

        if let Some(not_names) = &self.not_names {
            if not_names
                .iter()
                .any(|name| name_matches(entry, name, self.fuzzy))
            {
                return false;
            }
        }

        true
    }
}

fn name_matches(entry: &CatalogEntry, pattern: &str, fuzzy: bool) -> bool {
    if !fuzzy {
        return entry.name() == pattern;
    }
    let pattern = pattern.to_lowercase();
    entry.name().to_lowercase().contains(&pattern)
        || entry.did.to_string().to_lowercase().contains(&pattern)
}

/// A queryable, invalidatable set of catalog entries.
pub trait CatalogIndex {
    /// Every entry, in catalog order. Builds the index on first access.
    fn entries(&mut self) -> Result<&[CatalogEntry], MtdataError>;

    /// Forget any cached index so the next access rebuilds it.
    fn invalidate(&mut self) -> Result<(), MtdataError>;

    /// Entries matching `query`, in catalog order.
    fn lookup_entries(&mut self, query: &EntryQuery) -> Result<Vec<CatalogEntry>, MtdataError> {
        Ok(self
            .entries()?
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    /// The entry for `did`, also accepting the same dataset listed with its
    /// languages the other way around.
    fn get_entry(&mut self, did: &DatasetId) -> Result<Option<CatalogEntry>, MtdataError> {
        let entries = self.entries()?;
        let reversed = did.reversed();
        Ok(entries
            .iter()
            .find(|entry| entry.did == *did)
            .or_else(|| entries.iter().find(|entry| entry.did == reversed))
            .cloned())
    }
}

/// An in-memory catalog. Invalidation is a no-op.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }
}

impl CatalogIndex for StaticCatalog {
    fn entries(&mut self) -> Result<&[CatalogEntry], MtdataError> {
        Ok(&self.entries)
    }

    fn invalidate(&mut self) -> Result<(), MtdataError> {
        Ok(())
    }
}
