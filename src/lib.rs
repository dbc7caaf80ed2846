//! mtdata: find and fetch parallel corpora for machine translation.
//!
//! Datasets are listed in a catalog and addressed by ids of the form
//! `group-name-version-lang1-lang2`. The tool lists what is available,
//! downloads and prepares requested datasets into a directory ready for
//! training, and summarizes the catalog.
//!
//! # Modules
//!
//! - [`lang`]: language tags and language pairs
//! - [`entry`]: dataset ids and catalog entries
//! - [`catalog`]: the catalog index and its on-disk cache
//! - [`acquire`]: downloading, format parsing, merging and signatures
//! - [`report`]: output of `list` and `report`
//! - [`error`]: error types for mtdata operations

pub mod acquire;
pub mod catalog;
pub mod entry;
pub mod error;
pub mod lang;
pub mod report;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info, LevelFilter};

use acquire::{prepare_dataset, CorpusPreparer, Downloader, GetRequest, Signature};
use catalog::{CachedCatalog, CatalogIndex, EntryQuery};
use entry::parse_dataset_ids;
use lang::parse_lang_pair;
use report::{CatalogReport, EntryListing};

pub use error::MtdataError;

/// Name of the cache directory under the home directory when neither flag nor env is set.
pub const DEFAULT_CACHE_DIR: &str = ".mtdata";

/// The mtdata CLI application.
#[derive(Parser)]
#[command(name = "mtdata")]
#[command(version, about)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Verbose logging (also -vv).
    #[arg(long, global = true)]
    verbose: bool,

    /// Invalidate the cached catalog index before running (also -ri).
    #[arg(long, global = true)]
    reindex: bool,

    /// Cache directory holding the index, catalog sources and downloads.
    #[arg(long, global = true, env = "MTDATA")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the datasets in the catalog.
    List(ListArgs),
    /// Download and prepare datasets into a directory.
    Get(GetArgs),
    /// Count catalog entries per language pair and per name.
    Report(ReportArgs),
}

/// Catalog filters shared by `list` and `report`.
#[derive(clap::Args)]
struct FilterArgs {
    /// Language pair, e.g. deu-eng (either direction matches).
    #[arg(short = 'l', long = "langs")]
    langs: Option<String>,

    /// Keep entries with these names.
    #[arg(short = 'n', long = "names", num_args = 1..)]
    names: Option<Vec<String>>,

    /// Drop entries with these names (also -nn).
    #[arg(long = "not-names", num_args = 1..)]
    not_names: Option<Vec<String>>,
}

impl FilterArgs {
    fn into_query(self, fuzzy: bool) -> Result<EntryQuery, MtdataError> {
        let langs = self.langs.as_deref().map(parse_lang_pair).transpose()?;
        Ok(EntryQuery {
            langs,
            names: self.names,
            not_names: self.not_names,
            fuzzy,
        })
    }
}

#[derive(clap::Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Also print citations.
    #[arg(short = 'f', long = "full")]
    full: bool,

    /// Accepted for argument lists shared with `get`; ignored.
    #[arg(short = 'o', long = "out", hide = true)]
    _out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ReportArgs {
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(clap::Args)]
struct GetArgs {
    /// Language pair, e.g. deu-eng.
    #[arg(short = 'l', long = "langs", required = true)]
    langs: String,

    /// Training dataset ids (also -tr).
    #[arg(long = "train", num_args = 1..)]
    train: Vec<String>,

    /// Test dataset ids; never merged (also -ts).
    #[arg(long = "test", num_args = 1..)]
    test: Vec<String>,

    /// Merge train datasets into a single file.
    #[arg(long, overrides_with = "no_merge")]
    merge: bool,

    /// Keep train datasets as separate files (default).
    #[arg(long = "no-merge", overrides_with = "merge")]
    no_merge: bool,

    /// Output directory.
    #[arg(short = 'o', long = "out", required = true)]
    out: PathBuf,
}

/// Single-dash multi-letter flags and the long flags they stand for.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-vv", "--verbose"),
    ("-ri", "--reindex"),
    ("-tr", "--train"),
    ("-ts", "--test"),
    ("-nn", "--not-names"),
];

/// Rewrite legacy flags to their long form. Arguments after `--` are left alone.
fn expand_legacy_flags(args: Vec<OsString>) -> Vec<OsString> {
    let mut seen_separator = false;
    args.into_iter()
        .map(|arg| {
            if seen_separator {
                return arg;
            }
            if arg == "--" {
                seen_separator = true;
                return arg;
            }
            LEGACY_FLAGS
                .iter()
                .find(|(short, _)| arg == *short)
                .map(|(_, long)| OsString::from(*long))
                .unwrap_or(arg)
        })
        .collect()
}

/// Run the mtdata CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), MtdataError> {
    run_from(std::env::args_os())
}

/// Run the CLI on an explicit argument list (the first item is the program name).
pub fn run_from<I, T>(args: I) -> Result<(), MtdataError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = expand_legacy_flags(args.into_iter().map(Into::into).collect());
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    // Language pairs and dataset ids are checked before the cache is touched.
    let action = Action::from_command(cli.command)?;

    let cache_dir = resolve_cache_dir(cli.cache_dir)?;
    debug!("Cache directory: {}", cache_dir.display());
    let mut index = CachedCatalog::new(&cache_dir);
    if cli.reindex {
        index.invalidate()?;
    }

    match action {
        Action::List { query, full } => run_list(&mut index, &query, full),
        Action::Report { query } => run_report(&mut index, &query),
        Action::Get { request, signature } => {
            run_get(&mut index, cache_dir, &request, &signature)
        }
    }
}

/// A subcommand with its arguments parsed and validated.
enum Action {
    List { query: EntryQuery, full: bool },
    Report { query: EntryQuery },
    Get { request: GetRequest, signature: Signature },
}

impl Action {
    fn from_command(command: Commands) -> Result<Self, MtdataError> {
        match command {
            // `list` matches names fuzzily, `report` exactly.
            Commands::List(args) => Ok(Action::List {
                query: args.filter.into_query(true)?,
                full: args.full,
            }),
            Commands::Report(args) => Ok(Action::Report {
                query: args.filter.into_query(false)?,
            }),
            Commands::Get(args) => {
                let langs = parse_lang_pair(&args.langs)?;
                let (train, test) =
                    match (parse_dataset_ids(&args.train), parse_dataset_ids(&args.test)) {
                        (Ok(train), Ok(test)) => (train, test),
                        (train, test) => return Err(combine_errors(train.err(), test.err())),
                    };
                let request = GetRequest {
                    langs: langs.clone(),
                    train,
                    test,
                    out_dir: args.out,
                    merge: args.merge && !args.no_merge,
                };
                let signature = Signature::new(langs, args.train, args.test);
                Ok(Action::Get { request, signature })
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // A logger may already be installed when run repeatedly in one process.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn resolve_cache_dir(flag: Option<PathBuf>) -> Result<PathBuf, MtdataError> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CACHE_DIR))
        .ok_or_else(|| {
            MtdataError::Config("cannot locate home directory; set MTDATA or --cache-dir".into())
        })
}

fn run_list(
    index: &mut dyn CatalogIndex,
    query: &EntryQuery,
    full: bool,
) -> Result<(), MtdataError> {
    let entries = index.lookup_entries(query)?;
    info!("Found {} entries", entries.len());
    println!("{}", EntryListing::new(entries, full));
    Ok(())
}

fn run_report(index: &mut dyn CatalogIndex, query: &EntryQuery) -> Result<(), MtdataError> {
    let entries = index.lookup_entries(query)?;
    print!("{}", CatalogReport::from_entries(&entries));
    Ok(())
}

fn run_get(
    index: &mut dyn CatalogIndex,
    cache_dir: PathBuf,
    request: &GetRequest,
    signature: &Signature,
) -> Result<(), MtdataError> {
    let preparer = CorpusPreparer::new(Downloader::new(cache_dir));
    let dataset = prepare_dataset(index, &preparer, request)?;

    info!("Use this signature to reproduce:\n{}", signature.render().trim_end());
    let path = signature.append_to(&dataset.dir)?;
    debug!("Appended signature to {}", path.display());
    Ok(())
}

/// Merge the id errors of the train and test lists into one.
fn combine_errors(train: Option<MtdataError>, test: Option<MtdataError>) -> MtdataError {
    let mut errors: Vec<MtdataError> = train
        .into_iter()
        .chain(test)
        .flat_map(|err| match err {
            MtdataError::FormatErrors(inner) => inner,
            other => vec![other],
        })
        .collect();
    if errors.len() == 1 {
        errors.remove(0)
    } else {
        MtdataError::FormatErrors(errors)
    }
}
