//! Fetching raw distributions into the download cache.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use url::Url;

use crate::entry::DatasetId;
use crate::error::MtdataError;

/// Subdirectory of the cache directory holding raw downloads.
pub const DOWNLOADS_DIR: &str = "downloads";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolves entry locations to local files, downloading when needed.
///
/// `http(s)` urls are cached under `<cache_dir>/downloads/<group>/<name>-<version>/`.
/// `file://` urls and plain paths are used in place.
pub struct Downloader {
    cache_dir: PathBuf,
    agent: ureq::Agent,
}

impl Downloader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_recv_response(Some(RESPONSE_TIMEOUT))
            .build();
        Self {
            cache_dir: cache_dir.into(),
            agent: config.into(),
        }
    }

    /// Local path holding the data at `location`.
    pub fn fetch(&self, did: &DatasetId, location: &str) -> Result<PathBuf, MtdataError> {
        let retrieval = |message: String| MtdataError::Retrieval {
            did: did.to_string(),
            url: location.to_string(),
            message,
        };

        let local = match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| retrieval("not a valid local file url".to_string()))?,
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                return self.download(did, &url).map_err(|err| retrieval(err.to_string()));
            }
            Ok(url) => return Err(retrieval(format!("unsupported scheme '{}'", url.scheme()))),
            Err(url::ParseError::RelativeUrlWithoutBase) => PathBuf::from(location),
            Err(err) => return Err(retrieval(err.to_string())),
        };

        if !local.is_file() {
            return Err(retrieval(format!("no such file: {}", local.display())));
        }
        Ok(local)
    }

    /// Cache location for a remote url.
    pub fn cache_path(&self, did: &DatasetId, url: &Url) -> PathBuf {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download");
        self.cache_dir
            .join(DOWNLOADS_DIR)
            .join(did.group())
            .join(format!("{}-{}", did.name(), did.version()))
            .join(file_name)
    }

    fn download(&self, did: &DatasetId, url: &Url) -> Result<PathBuf, DownloadError> {
        let dest = self.cache_path(did, url);
        if dest.is_file() {
            debug!("Using cached {}", dest.display());
            return Ok(dest);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Downloading {url} -> {}", dest.display());
        let mut response = self.agent.get(url.as_str()).call()?;
        let part = part_path(&dest);
        write_part(&mut response.body_mut().as_reader(), &part)?;
        fs::rename(&part, &dest)?;
        Ok(dest)
    }
}

/// Stream `reader` into `part`, removing it again if the transfer fails.
fn write_part(reader: &mut dyn Read, part: &Path) -> io::Result<()> {
    let copied = File::create(part).and_then(|file| {
        let mut writer = BufWriter::new(file);
        io::copy(reader, &mut writer)?;
        writer.flush()
    });
    if copied.is_err() && part.exists() {
        if let Err(err) = fs::remove_file(part) {
            warn!("Could not remove {}: {err}", part.display());
        }
    }
    copied
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[derive(Debug, thiserror::Error)]
enum DownloadError {
    #[error("{0}")]
    Http(#[from] ureq::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
}
