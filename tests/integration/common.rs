//! Shared fixtures: a dated archive laid out as `<root>/<year>/MM-YYYY/MM_DD`.

#![allow(dead_code)]

use chrono::NaiveDate;
use ocrfind::config::Config;
use ocrfind::search::phase::{day_partition, YEAR_PLACEHOLDER};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Archive {
    pub dir: TempDir,
}

impl Archive {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("ocr")).unwrap();
        fs::create_dir_all(dir.path().join("working")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("ocr")
    }

    pub fn working(&self) -> PathBuf {
        self.dir.path().join("working")
    }

    pub fn dated_template(&self) -> String {
        self.root()
            .join(YEAR_PLACEHOLDER)
            .to_string_lossy()
            .into_owned()
    }

    /// Create `<partition of date>/<folder>` with one file inside.
    pub fn add_folder(&self, date: NaiveDate, folder: &str) -> PathBuf {
        let path = day_partition(&self.dated_template(), date).join(folder);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("ocr.pdf"), folder.as_bytes()).unwrap();
        path
    }

    pub fn add_working_file(&self, name: &str) -> PathBuf {
        let path = self.working().join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    pub fn config(&self) -> Config {
        Config {
            dated_roots: vec![self.dated_template()],
            archive_roots: vec![self.root()],
            ..Default::default()
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
