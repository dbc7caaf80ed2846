//! Dataset acquisition: resolve ids, prepare corpora, optionally merge.
//!
//! Remote and format concerns live in [`download`] and [`corpus`]; this
//! module only orders the work and lays out the output directory:
//!
//! ```text
//! <out>/train-parts/<id>.<lang>   one pair per train dataset
//! <out>/train.<lang>              merged train (replaces train-parts)
//! <out>/tests/<id>.<lang>         one pair per test dataset, never merged
//! <out>/mtdata.signature.txt      appended by the caller, see [`signature`]
//! ```

pub mod corpus;
pub mod download;
pub mod signature;

pub use corpus::CorpusPreparer;
pub use download::{Downloader, DOWNLOADS_DIR};
pub use signature::{Signature, SIGNATURE_FILE};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::catalog::CatalogIndex;
use crate::entry::{CatalogEntry, DatasetId};
use crate::error::MtdataError;
use crate::lang::{LangPair, LanguageTag};

pub const TRAIN_PARTS_DIR: &str = "train-parts";
pub const TESTS_DIR: &str = "tests";
pub const MERGED_TRAIN_STEM: &str = "train";

/// Produces the two text files of one catalog entry.
pub trait Preparer {
    /// Write `<dest>/<entry id>.<lang>` for both languages of the entry.
    ///
    /// Fails with `Retrieval` when the data cannot be fetched and `Prepare`
    /// when it cannot be turned into aligned text.
    fn prepare(&self, entry: &CatalogEntry, dest: &Path) -> Result<ParallelFiles, MtdataError>;
}

/// Two line-aligned files, `paths[i]` holding the language at position `i` of `langs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelFiles {
    pub langs: LangPair,
    pub paths: [PathBuf; 2],
}

impl ParallelFiles {
    /// The file holding `lang`, if it is one of the two sides.
    pub fn path_for(&self, lang: &LanguageTag) -> Option<&Path> {
        self.langs
            .iter()
            .position(|side| side == lang)
            .map(|i| self.paths[i].as_path())
    }
}

/// `<dir>/<stem>.<lang>`
pub fn side_path(dir: &Path, stem: &str, lang: &LanguageTag) -> PathBuf {
    dir.join(format!("{stem}.{lang}"))
}

/// What to fetch and where to put it.
#[derive(Clone, Debug)]
pub struct GetRequest {
    pub langs: LangPair,
    pub train: Vec<DatasetId>,
    pub test: Vec<DatasetId>,
    pub out_dir: PathBuf,
    pub merge: bool,
}

/// A prepared dataset directory.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub dir: PathBuf,
    /// Per-dataset train files; empty when they were merged.
    pub train: Vec<ParallelFiles>,
    pub tests: Vec<ParallelFiles>,
    pub merged_train: Option<ParallelFiles>,
}

/// Resolve, fetch and lay out every requested dataset.
///
/// All preconditions (non-empty request, compatible languages, every id in
/// the catalog) are checked before anything is written. The first failing
/// dataset aborts the whole request; files written before it stay on disk.
pub fn prepare_dataset(
    index: &mut dyn CatalogIndex,
    preparer: &dyn Preparer,
    request: &GetRequest,
) -> Result<Dataset, MtdataError> {
    if request.train.is_empty() && request.test.is_empty() {
        return Err(MtdataError::Usage(
            "train or test or both required".to_string(),
        ));
    }

    for did in request.train.iter().chain(&request.test) {
        if !did.langs().is_compatible(&request.langs) {
            return Err(MtdataError::Usage(format!(
                "dataset {did} does not match languages {}",
                request.langs
            )));
        }
    }

    let train_entries = resolve_all(index, &request.train)?;
    let test_entries = resolve_all(index, &request.test)?;

    fs::create_dir_all(&request.out_dir)?;
    let train_dir = request.out_dir.join(TRAIN_PARTS_DIR);
    let tests_dir = request.out_dir.join(TESTS_DIR);

    let mut train = Vec::with_capacity(train_entries.len());
    for entry in &train_entries {
        train.push(preparer.prepare(entry, &train_dir)?);
    }
    let mut tests = Vec::with_capacity(test_entries.len());
    for entry in &test_entries {
        tests.push(preparer.prepare(entry, &tests_dir)?);
    }

    let merged_train = if request.merge && train.len() > 1 {
        let merged = merge_train(&request.langs, &train, &request.out_dir)?;
        remove_parts(&train, &train_dir)?;
        train.clear();
        Some(merged)
    } else {
        None
    };

    info!("Dataset is ready at {}", request.out_dir.display());
    Ok(Dataset {
        dir: request.out_dir.clone(),
        train,
        tests,
        merged_train,
    })
}

fn resolve_all(
    index: &mut dyn CatalogIndex,
    dids: &[DatasetId],
) -> Result<Vec<CatalogEntry>, MtdataError> {
    dids.iter()
        .map(|did| {
            index
                .get_entry(did)?
                .ok_or_else(|| MtdataError::NotFound {
                    did: did.to_string(),
                })
        })
        .collect()
}

/// Concatenate every part, in order, into `<out>/train.<lang>` per language.
fn merge_train(
    langs: &LangPair,
    parts: &[ParallelFiles],
    out_dir: &Path,
) -> Result<ParallelFiles, MtdataError> {
    let paths = [
        side_path(out_dir, MERGED_TRAIN_STEM, &langs.source),
        side_path(out_dir, MERGED_TRAIN_STEM, &langs.target),
    ];

    for (lang, path) in langs.iter().zip(&paths) {
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut writer = BufWriter::new(File::create(&tmp)?);
        for part in parts {
            let source = part.path_for(lang).ok_or_else(|| MtdataError::Prepare {
                did: part.langs.to_string(),
                message: format!("no {lang} side to merge"),
            })?;
            io::copy(&mut File::open(source)?, &mut writer)?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, path)?;
        debug!("Merged {} parts into {}", parts.len(), path.display());
    }

    Ok(ParallelFiles {
        langs: langs.clone(),
        paths,
    })
}

fn remove_parts(parts: &[ParallelFiles], dir: &Path) -> Result<(), MtdataError> {
    for path in parts.iter().flat_map(|part| part.paths.iter()) {
        if path.exists() {
            fs::remove_file(path)?;
        }
    }
    if fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
    }
    Ok(())
}
