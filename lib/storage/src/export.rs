//! JSON and CSV dataset files.
//!
//! Both formats are written from the same record slice in the same order. Files
//! are replaced atomically, so a reader never sees a half-written dataset.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use reframe_core::{Error, ExamplePair, GeneratedRecord, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// A record type that can be exported as a dataset row
pub trait DatasetRecord: Serialize + DeserializeOwned {
    /// CSV header, matching the JSON keys
    const HEADERS: &'static [&'static str];

    /// One CSV row, aligned with `HEADERS`
    fn csv_row(&self) -> Vec<&str>;
}

impl DatasetRecord for ExamplePair {
    const HEADERS: &'static [&'static str] = &["dysfunctional", "functional"];

    fn csv_row(&self) -> Vec<&str> {
        vec![self.dysfunctional_text.as_str(), self.functional_text.as_str()]
    }
}

impl DatasetRecord for GeneratedRecord {
    const HEADERS: &'static [&'static str] = &["dysfunctional", "functional"];

    fn csv_row(&self) -> Vec<&str> {
        vec![
            self.dysfunctional_text.as_str(),
            self.functional_text.as_deref().unwrap_or(""),
        ]
    }
}

/// Write `records` as a pretty-printed JSON array
pub fn write_json<T: DatasetRecord>(path: &Path, records: &[T]) -> Result<()> {
    write_atomic(path, |file| {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut *file, formatter);
        records.serialize(&mut ser)?;
        file.write_all(b"\n")?;
        Ok(())
    })?;
    info!("Saved {} records to {:?}", records.len(), path);
    Ok(())
}

/// Write `records` as CSV with a header row, even when there are no records
pub fn write_csv<T: DatasetRecord>(path: &Path, records: &[T]) -> Result<()> {
    write_atomic(path, |file| {
        let mut writer = csv::Writer::from_writer(&mut *file);
        writer.write_record(T::HEADERS).map_err(csv_err)?;
        for record in records {
            writer.write_record(record.csv_row()).map_err(csv_err)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    info!("Saved {} records to {:?}", records.len(), path);
    Ok(())
}

/// Write both formats for one dataset
pub fn write_dataset<T: DatasetRecord>(json_path: &Path, csv_path: &Path, records: &[T]) -> Result<()> {
    write_json(json_path, records)?;
    write_csv(csv_path, records)
}

/// Load a JSON dataset written by [`write_json`]
pub fn read_json<T: DatasetRecord>(path: &Path) -> Result<Vec<T>> {
    info!("Loading file: {:?}", path);
    let file = File::open(path)?;
    let records = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(records)
}

fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(write)
        .map_err(|e| match e {
            atomicwrites::Error::Internal(io) => Error::Io(io),
            atomicwrites::Error::User(e) => e,
        })
}

fn csv_err(e: csv::Error) -> Error {
    Error::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<ExamplePair> {
        vec![
            ExamplePair::new("You're always late, as usual.", "I'd like us to be on time."),
            ExamplePair::new("Whatever, \"expert\".", "I see it differently, can we discuss?"),
        ]
    }

    #[test]
    fn test_json_and_csv_share_order() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("data.json");
        let csv_path = dir.path().join("data.csv");
        write_dataset(&json, &csv_path, &pairs()).unwrap();

        let loaded: Vec<ExamplePair> = read_json(&json).unwrap();
        assert_eq!(loaded, pairs());

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["dysfunctional", "functional"]
        );
        let rows: Vec<ExamplePair> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, pairs());
    }

    #[test]
    fn test_json_uses_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("data.json");
        write_json(&json, &pairs()[..1]).unwrap();

        let raw = std::fs::read_to_string(&json).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"dysfunctional\""));
    }

    #[test]
    fn test_empty_dataset_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("out").join("empty.json");
        let csv_path = dir.path().join("out").join("empty.csv");
        write_dataset::<ExamplePair>(&json, &csv_path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&json).unwrap().trim(), "[]");
        assert_eq!(
            std::fs::read_to_string(&csv_path).unwrap(),
            "dysfunctional,functional\n"
        );
    }

    #[test]
    fn test_generated_records_without_functional() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("raw.json");
        let csv_path = dir.path().join("raw.csv");
        let records = vec![GeneratedRecord {
            dysfunctional_text: "You're hopeless.".to_string(),
            functional_text: None,
        }];
        write_dataset(&json, &csv_path, &records).unwrap();

        let loaded: Vec<GeneratedRecord> = read_json(&json).unwrap();
        assert_eq!(loaded, records);
        assert_eq!(
            std::fs::read_to_string(&csv_path).unwrap(),
            "dysfunctional,functional\nYou're hopeless.,\n"
        );
    }
}
