//! Catalog entries and their distribution formats.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DatasetId;
use crate::error::MtdataError;
use crate::lang::LangPair;

/// Where an entry's raw data lives.
///
/// Most distributions ship both sides in one file; plain-text corpora are
/// often split into one url per language, in the order of the id's languages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryUrl {
    Single(String),
    Pair([String; 2]),
}

impl EntryUrl {
    pub fn as_slice(&self) -> &[String] {
        match self {
            EntryUrl::Single(url) => std::slice::from_ref(url),
            EntryUrl::Pair(urls) => urls.as_slice(),
        }
    }
}

/// One downloadable parallel corpus listed in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub did: DatasetId,
    pub url: EntryUrl,
    /// Distribution format; inferred from the url when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Member paths inside a zip archive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_paths: Vec<String>,
    /// TSV columns holding the first and second language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cite: Option<String>,
}

impl CatalogEntry {
    pub fn new(did: DatasetId, url: EntryUrl) -> Self {
        Self {
            did,
            url,
            ext: None,
            in_paths: Vec::new(),
            cols: None,
            cite: None,
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_in_paths(mut self, in_paths: Vec<String>) -> Self {
        self.in_paths = in_paths;
        self
    }

    pub fn with_cite(mut self, cite: impl Into<String>) -> Self {
        self.cite = Some(cite.into());
        self
    }

    pub fn name(&self) -> &str {
        self.did.name()
    }

    pub fn langs(&self) -> &LangPair {
        self.did.langs()
    }

    pub fn tsv_columns(&self) -> [usize; 2] {
        self.cols.unwrap_or([0, 1])
    }

    /// Resolve the distribution format, explicit or inferred.
    pub fn format(&self) -> Result<EntryFormat, MtdataError> {
        let ext = match &self.ext {
            Some(ext) => ext.clone(),
            None => infer_ext(&self.url.as_slice()[0]).ok_or_else(|| self.invalid(
                "cannot infer format from url; set 'ext' explicitly",
            ))?,
        };

        let ext = if ext == "zip" {
            let inner = self
                .in_paths
                .first()
                .and_then(|path| infer_ext(path))
                .ok_or_else(|| self.invalid("zip entries need 'in_paths' with a known format"))?;
            format!("{inner}.zip")
        } else {
            ext
        };

        EntryFormat::from_ext(&ext)
            .ok_or_else(|| self.invalid(format!("unsupported format '{ext}'")))
    }

    /// Check that the urls and archive members fit the format.
    pub fn validate(&self) -> Result<EntryFormat, MtdataError> {
        let format = self.format()?;
        let urls = self.url.as_slice().len();
        let members = self.in_paths.len();
        let sides = match format.layout {
            Layout::Txt => 2,
            Layout::Tsv | Layout::Tmx => 1,
        };

        if format.container == Container::Zip {
            if urls != 1 || members != sides {
                return Err(self.invalid(format!(
                    "{format} needs one url and {sides} in_paths, found {urls} url(s) and {members} in_paths"
                )));
            }
        } else if urls != sides {
            return Err(self.invalid(format!("{format} needs {sides} url(s), found {urls}")));
        }

        if let Some([a, b]) = self.cols {
            if a == b {
                return Err(self.invalid("cols must name two different columns"));
            }
        }

        Ok(format)
    }

    /// One-line summary with fields separated by `delim`.
    pub fn summary(&self, delim: &str) -> String {
        let format = self
            .format()
            .map(|f| f.to_string())
            .unwrap_or_else(|_| "?".to_string());
        format!(
            "{}{delim}{}{delim}{}",
            self.did,
            format,
            self.url.as_slice().join(" ")
        )
    }

    fn invalid(&self, message: impl Into<String>) -> MtdataError {
        MtdataError::CatalogInvalid {
            did: self.did.to_string(),
            message: message.into(),
        }
    }
}

/// How the two sides of a corpus are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One file, one column per language.
    Tsv,
    /// Two line-aligned files, one per language.
    Txt,
    /// Translation memory exchange XML.
    Tmx,
}

/// Compression or archive wrapping the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Plain,
    Gzip,
    Zip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryFormat {
    pub layout: Layout,
    pub container: Container,
}

const KNOWN_EXTS: [&str; 10] = [
    "tsv.gz", "txt.gz", "tmx.gz", "tsv.zip", "txt.zip", "tmx.zip", "tsv", "txt", "tmx", "zip",
];

impl EntryFormat {
    pub fn from_ext(ext: &str) -> Option<Self> {
        let (layout, container) = match ext.split_once('.') {
            Some((layout, "gz")) => (layout, Container::Gzip),
            Some((layout, "zip")) => (layout, Container::Zip),
            Some(_) => return None,
            None => (ext, Container::Plain),
        };
        let layout = match layout {
            "tsv" => Layout::Tsv,
            "txt" => Layout::Txt,
            "tmx" => Layout::Tmx,
            _ => return None,
        };
        Some(Self { layout, container })
    }
}

impl fmt::Display for EntryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.layout {
            Layout::Tsv => "tsv",
            Layout::Txt => "txt",
            Layout::Tmx => "tmx",
        };
        match self.container {
            Container::Plain => f.write_str(layout),
            Container::Gzip => write!(f, "{layout}.gz"),
            Container::Zip => write!(f, "{layout}.zip"),
        }
    }
}

/// Guess the extension from the file name at the end of a url or path.
pub fn infer_ext(location: &str) -> Option<String> {
    let without_query = location.split(['?', '#']).next().unwrap_or_default();
    let file_name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    KNOWN_EXTS
        .iter()
        .find(|ext| file_name.ends_with(&format!(".{ext}")))
        .map(|ext| ext.to_string())
}
