#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A scratch cache directory with a user catalog pointing at local corpora.
pub struct Fixture {
    temp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            temp: tempfile::tempdir().expect("create temp dir"),
        };
        fs::create_dir_all(fixture.data_dir()).expect("create data dir");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    /// Write a two-column TSV corpus and return its path.
    pub fn write_tsv(&self, name: &str, rows: &[(&str, &str)]) -> PathBuf {
        let path = self.data_dir().join(name);
        let body: String = rows.iter().map(|(a, b)| format!("{a}\t{b}\n")).collect();
        fs::write(&path, body).expect("write corpus");
        path
    }

    /// Write `catalog.d/<name>` inside the cache directory.
    pub fn write_catalog(&self, name: &str, body: &str) {
        let dir = self.cache_dir().join("catalog.d");
        fs::create_dir_all(&dir).expect("create catalog.d");
        fs::write(dir.join(name), body).expect("write catalog source");
    }

    /// Two deu-eng train sets, an eng-deu test set and a fin-eng set.
    pub fn with_toy_catalog(self) -> Self {
        let toy1 = self.write_tsv("toy1.tsv", &[("Hallo", "Hello"), ("Welt", "World")]);
        let toy2 = self.write_tsv("toy2.tsv", &[("Haus", "House")]);
        let dev = self.write_tsv("dev.tsv", &[("Good morning", "Guten Morgen")]);
        let fin = self.write_tsv("fin.tsv", &[("Hei", "Hi")]);

        let entry = |did: &str, path: &Path| {
            format!("  - did: {did}\n    url: '{}'\n", path.display())
        };
        let body = [
            "entries:\n".to_string(),
            entry("Local-toy-1-deu-eng", &toy1) + "    cite: '@misc{toy1}'\n",
            entry("Local-toy-2-deu-eng", &toy2),
            entry("Local-dev-1-eng-deu", &dev),
            entry("Local-hello-1-fin-eng", &fin),
        ]
        .concat();
        self.write_catalog("local.yaml", &body);
        self
    }

    /// The binary, pointed at this fixture's cache directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mtdata").expect("binary");
        cmd.env("MTDATA", self.cache_dir()).env_remove("RUST_LOG");
        cmd
    }
}
