//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use placetime::archive::{LineSource, SourceFile};
use placetime::config::WalSyncStrategy;
use placetime::{Config, PlaceRecord, Result};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const BUENOS_AIRES_TZ: &str = "America/Argentina/Buenos_Aires";

/// A full 19-column geonames line
pub fn geonames_line(id: &str, name: &str, country: &str, population: &str, timezone: &str) -> String {
    let mut cols = vec![String::new(); 19];
    cols[0] = id.to_string();
    cols[1] = name.to_string();
    cols[2] = name.to_string();
    cols[4] = "-34.6".to_string();
    cols[5] = "-58.4".to_string();
    cols[6] = "P".to_string();
    cols[7] = "PPLC".to_string();
    cols[8] = country.to_string();
    cols[14] = population.to_string();
    cols[17] = timezone.to_string();
    cols[18] = "2021-01-01".to_string();
    cols.join("\t")
}

pub fn buenos_aires_line() -> String {
    geonames_line("3451190", "Buenos Aires", "AR", "13076300", BUENOS_AIRES_TZ)
}

pub fn place(id: &str, name: &str, country: &str, timezone: &str, population: u64) -> PlaceRecord {
    PlaceRecord {
        id: id.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        timezone: timezone.to_string(),
        population,
    }
}

/// Zip the given (name, contents) pairs into memory
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write a zip archive with the given files to `path`
pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut file = File::create(path).unwrap();
    file.write_all(&zip_bytes(files)).unwrap();
    file.sync_all().unwrap();
}

pub fn setup_temp_store() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("data"))
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .build();
    (temp_dir, config)
}

pub fn setup_temp_archive(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dump.zip");
    write_zip(&path, files);
    (temp_dir, path)
}

/// Line source backed by in-memory files
pub struct FixtureSource {
    files: VecDeque<(String, Vec<String>)>,
}

impl FixtureSource {
    pub fn new(files: &[(&str, &[&str])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, lines)| {
                    (name.to_string(), lines.iter().map(|l| l.to_string()).collect())
                })
                .collect(),
        }
    }

    pub fn single(name: &str, lines: Vec<String>) -> Self {
        let mut files = VecDeque::new();
        files.push_back((name.to_string(), lines));
        Self { files }
    }
}

impl LineSource for FixtureSource {
    fn next_file(&mut self) -> Option<Result<SourceFile<'_>>> {
        let (name, lines) = self.files.pop_front()?;
        Some(Ok(SourceFile::new(name, lines.into_iter().map(Ok))))
    }
}
