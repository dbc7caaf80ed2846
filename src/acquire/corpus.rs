//! Turning raw distributions into line-aligned text files, one per language.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::{debug, info, warn};
use roxmltree::Node;

use super::download::Downloader;
use super::{side_path, ParallelFiles, Preparer};
use crate::entry::{CatalogEntry, Container, EntryFormat, Layout};
use crate::error::MtdataError;
use crate::lang::{resolve_tag, LangPair};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The default [`Preparer`]: download, decompress and split into sides.
pub struct CorpusPreparer {
    downloader: Downloader,
}

impl CorpusPreparer {
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }
}

impl Preparer for CorpusPreparer {
    fn prepare(&self, entry: &CatalogEntry, dest: &Path) -> Result<ParallelFiles, MtdataError> {
        let format = entry.validate()?;
        let langs = entry.langs().clone();
        let stem = entry.did.to_string();
        let outputs = [
            side_path(dest, &stem, &langs.source),
            side_path(dest, &stem, &langs.target),
        ];
        let files = ParallelFiles {
            langs,
            paths: outputs.clone(),
        };

        if outputs.iter().all(|path| path.is_file()) {
            debug!("{} is already prepared in {}", entry.did, dest.display());
            return Ok(files);
        }
        fs::create_dir_all(dest)?;

        let local = entry
            .url
            .as_slice()
            .iter()
            .map(|location| self.downloader.fetch(&entry.did, location))
            .collect::<Result<Vec<_>, _>>()?;

        let prepare_error = |message: String| MtdataError::Prepare {
            did: entry.did.to_string(),
            message,
        };
        let count = extract(entry, format, &local, &outputs).map_err(|err| match err {
            ExtractError::Io(source) => prepare_error(source.to_string()),
            ExtractError::Data(message) => prepare_error(message),
        })?;
        info!("Prepared {} segments for {}", count, entry.did);
        Ok(files)
    }
}

#[derive(Debug)]
enum ExtractError {
    Io(io::Error),
    Data(String),
}

impl From<io::Error> for ExtractError {
    fn from(v: io::Error) -> Self {
        Self::Io(v)
    }
}

/// Write both sides of `entry` from the fetched `local` files into `outputs`.
///
/// Returns the number of aligned segments written.
fn extract(
    entry: &CatalogEntry,
    format: EntryFormat,
    local: &[PathBuf],
    outputs: &[PathBuf; 2],
) -> Result<usize, ExtractError> {
    let member = |i: usize| entry.in_paths.get(i).map(String::as_str);
    let mut sink = PairWriter::create(outputs)?;

    let read = match format.layout {
        Layout::Tsv => with_reader(&local[0], format.container, member(0), |reader| {
            read_tsv(reader, entry.tsv_columns(), &mut sink)
        }),
        Layout::Tmx => with_reader(&local[0], format.container, member(0), |reader| {
            read_tmx(reader, entry.langs(), &mut sink)
        }),
        Layout::Txt => {
            // Zip distributions keep both sides in one archive.
            let second = local.get(1).unwrap_or(&local[0]);
            with_reader(&local[0], format.container, member(0), |first_reader| {
                with_reader(second, format.container, member(1), |second_reader| {
                    read_txt_pair(first_reader, second_reader, &mut sink)
                })
            })
        }
    };

    match read {
        Ok(()) => Ok(sink.finish()?),
        Err(err) => {
            sink.discard();
            Err(err)
        }
    }
}

/// Open `path` according to `container` and hand the decoded stream to `f`.
fn with_reader<T>(
    path: &Path,
    container: Container,
    member: Option<&str>,
    f: impl FnOnce(&mut dyn Read) -> Result<T, ExtractError>,
) -> Result<T, ExtractError> {
    let file = File::open(path)?;
    match container {
        Container::Plain => f(&mut BufReader::new(file)),
        Container::Gzip => f(&mut BufReader::new(MultiGzDecoder::new(file))),
        Container::Zip => {
            let name = member.ok_or_else(|| ExtractError::Data("missing in_paths".into()))?;
            let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|source| {
                ExtractError::Data(format!("{}: {source}", path.display()))
            })?;
            let mut zipped = archive.by_name(name).map_err(|source| {
                ExtractError::Data(format!("{}!{name}: {source}", path.display()))
            })?;
            f(&mut zipped)
        }
    }
}

fn read_tsv(
    reader: &mut dyn Read,
    [first, second]: [usize; 2],
    sink: &mut PairWriter,
) -> Result<(), ExtractError> {
    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut skipped = 0usize;
    for (row, record) in tsv.byte_records().enumerate() {
        let record = record
            .map_err(|source| ExtractError::Data(format!("row {}: {source}", row + 1)))?;
        match (record.get(first), record.get(second)) {
            (Some(a), Some(b)) => {
                sink.write(&String::from_utf8_lossy(a), &String::from_utf8_lossy(b))?
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {skipped} rows without columns {first} and {second}");
    }
    Ok(())
}

fn read_txt_pair(
    first: &mut dyn Read,
    second: &mut dyn Read,
    sink: &mut PairWriter,
) -> Result<(), ExtractError> {
    let mut first_lines = BufReader::new(first).lines();
    let mut second_lines = BufReader::new(second).lines();
    let mut line_no = 0usize;

    loop {
        line_no += 1;
        match (first_lines.next(), second_lines.next()) {
            (Some(a), Some(b)) => sink.write(&a?, &b?)?,
            (None, None) => return Ok(()),
            _ => {
                return Err(ExtractError::Data(format!(
                    "line count mismatch: one side ends at line {line_no}"
                )))
            }
        }
    }
}

fn read_tmx(
    reader: &mut dyn Read,
    langs: &LangPair,
    sink: &mut PairWriter,
) -> Result<(), ExtractError> {
    let mut xml = String::new();
    reader.read_to_string(&mut xml)?;
    let doc = roxmltree::Document::parse(&xml)
        .map_err(|source| ExtractError::Data(format!("invalid TMX: {source}")))?;

    let mut skipped = 0usize;
    for tu in doc.descendants().filter(|n| n.has_tag_name("tu")) {
        let mut sides: [Option<String>; 2] = [None, None];
        for tuv in tu.children().filter(|n| n.has_tag_name("tuv")) {
            let Some(lang) = tuv
                .attribute((XML_NAMESPACE, "lang"))
                .or_else(|| tuv.attribute("lang"))
            else {
                continue;
            };
            if let Some(side) = tmx_side(lang, langs) {
                sides[side] = tuv.children().find(|n| n.has_tag_name("seg")).map(seg_text);
            }
        }

        match sides {
            [Some(a), Some(b)] => sink.write(&a, &b)?,
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} translation units missing one side");
    }
    Ok(())
}

/// Which side of `langs` a TMX `xml:lang` value (`de`, `de-DE`, `pt_BR`) refers to.
fn tmx_side(lang: &str, langs: &LangPair) -> Option<usize> {
    let tag = resolve_tag(&lang.replace('-', "_"))
        .or_else(|_| resolve_tag(lang.split(['-', '_']).next().unwrap_or_default()))
        .ok()?;

    langs
        .iter()
        .position(|side| *side == tag)
        .or_else(|| langs.iter().position(|side| side.code() == tag.code()))
}

fn seg_text(seg: Node) -> String {
    seg.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Writes aligned segment pairs to temp files and renames them on finish.
struct PairWriter {
    writers: [BufWriter<File>; 2],
    tmp_paths: [PathBuf; 2],
    paths: [PathBuf; 2],
    count: usize,
}

impl PairWriter {
    fn create(paths: &[PathBuf; 2]) -> io::Result<Self> {
        let tmp_paths = [tmp_path(&paths[0]), tmp_path(&paths[1])];
        let first = BufWriter::new(File::create(&tmp_paths[0])?);
        let second = match File::create(&tmp_paths[1]) {
            Ok(file) => BufWriter::new(file),
            Err(err) => {
                drop(first);
                let _ = fs::remove_file(&tmp_paths[0]);
                return Err(err);
            }
        };
        let writers = [first, second];
        Ok(Self {
            writers,
            tmp_paths,
            paths: paths.clone(),
            count: 0,
        })
    }

    fn write(&mut self, first: &str, second: &str) -> io::Result<()> {
        writeln!(self.writers[0], "{}", flatten(first))?;
        writeln!(self.writers[1], "{}", flatten(second))?;
        self.count += 1;
        Ok(())
    }

    /// Drop the partial output.
    fn discard(self) {
        let Self {
            writers, tmp_paths, ..
        } = self;
        drop(writers);
        for tmp in &tmp_paths {
            if let Err(err) = fs::remove_file(tmp) {
                warn!("Could not remove {}: {err}", tmp.display());
            }
        }
    }

    fn finish(self) -> io::Result<usize> {
        let Self {
            writers,
            tmp_paths,
            paths,
            count,
        } = self;
        for mut writer in writers {
            writer.flush()?;
        }
        for (tmp, path) in tmp_paths.iter().zip(paths.iter()) {
            fs::rename(tmp, path)?;
        }
        Ok(count)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// One segment per line: embedded line breaks become spaces.
fn flatten(segment: &str) -> String {
    segment
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
