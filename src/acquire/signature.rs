//! Reproducibility signatures appended to every prepared dataset directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::MtdataError;
use crate::lang::LangPair;

/// File name of the signature inside the output directory.
pub const SIGNATURE_FILE: &str = "mtdata.signature.txt";

/// The invocation that produced a dataset directory.
///
/// Dataset ids are kept exactly as the user typed them.
#[derive(Clone, Debug)]
pub struct Signature {
    pub langs: LangPair,
    pub train: Vec<String>,
    pub test: Vec<String>,
    pub version: String,
}

impl Signature {
    pub fn new(langs: LangPair, train: Vec<String>, test: Vec<String>) -> Self {
        Self {
            langs,
            train,
            test,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The newline-terminated record.
    pub fn render(&self) -> String {
        let mut cli = format!("-l {}", self.langs);
        if !self.train.is_empty() {
            cli.push_str(&format!(" -tr {}", self.train.join(" ")));
        }
        if !self.test.is_empty() {
            cli.push_str(&format!(" -ts {}", self.test.join(" ")));
        }
        format!(
            "mtdata get {cli} -o <out-dir>\nmtdata version {}\n",
            self.version
        )
    }

    /// Append the record to `<dir>/mtdata.signature.txt` in a single write.
    pub fn append_to(&self, dir: &Path) -> Result<PathBuf, MtdataError> {
        let path = dir.join(SIGNATURE_FILE);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(path)
    }
}
