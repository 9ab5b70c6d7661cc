//! Destinations for generation reports and saved networks.
use super::errors::PersistenceError;
use super::logging::GenerationRecord;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives a population's persistent output.
///
/// Failed writes are reported back to the population,
/// which logs and collects them without halting evolution.
pub trait ReportSink {
    /// Stores the full fitness history, replacing
    /// any previously written report.
    fn write_report(&mut self, record: &GenerationRecord) -> Result<(), PersistenceError>;

    /// Stores the text record of the network ranked `rank`
    /// (0 being the best) at the end of `generation`.
    fn write_network(
        &mut self,
        generation: usize,
        rank: usize,
        record: &str,
    ) -> Result<(), PersistenceError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_report(&mut self, record: &GenerationRecord) -> Result<(), PersistenceError> {
        (**self).write_report(record)
    }

    fn write_network(
        &mut self,
        generation: usize,
        rank: usize,
        record: &str,
    ) -> Result<(), PersistenceError> {
        (**self).write_network(generation, rank, record)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn write_report(&mut self, record: &GenerationRecord) -> Result<(), PersistenceError> {
        (**self).write_report(record)
    }

    fn write_network(
        &mut self,
        generation: usize,
        rank: usize,
        record: &str,
    ) -> Result<(), PersistenceError> {
        (**self).write_network(generation, rank, record)
    }
}

/// File name of a saved network.
///
/// # Examples
/// ```
/// use oxiga::populations::sink::network_file_name;
///
/// assert_eq!(network_file_name(200, 3), "network_gen200_rank3.csv");
/// ```
pub fn network_file_name(generation: usize, rank: usize) -> String {
    format!("network_gen{}_rank{}.csv", generation, rank)
}

/// Writes reports and networks as files inside a directory.
///
/// Every write opens, fills and closes its file, so
/// nothing stays open between generations.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// File name of the generation report.
    pub const REPORT_FILE: &'static str = "stats.csv";

    /// Creates the sink, creating `root` and its parents if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<DirectorySink, PersistenceError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| PersistenceError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(DirectorySink { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(Self::REPORT_FILE)
    }

    pub fn network_path(&self, generation: usize, rank: usize) -> PathBuf {
        self.root.join(network_file_name(generation, rank))
    }

    fn write(path: PathBuf, contents: &str) -> Result<(), PersistenceError> {
        fs::write(&path, contents).map_err(|source| PersistenceError::Io { path, source })
    }
}

impl ReportSink for DirectorySink {
    fn write_report(&mut self, record: &GenerationRecord) -> Result<(), PersistenceError> {
        Self::write(self.report_path(), &record.to_string())
    }

    fn write_network(
        &mut self,
        generation: usize,
        rank: usize,
        record: &str,
    ) -> Result<(), PersistenceError> {
        Self::write(self.network_path(generation, rank), record)
    }
}

/// Keeps everything in memory. Useful for tests
/// and for hosts that do their own storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    report: String,
    report_writes: usize,
    networks: BTreeMap<(usize, usize), String>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// The most recently written report.
    pub fn report(&self) -> &str {
        &self.report
    }

    /// How many times the report has been written.
    pub fn report_writes(&self) -> usize {
        self.report_writes
    }

    pub fn network(&self, generation: usize, rank: usize) -> Option<&str> {
        self.networks.get(&(generation, rank)).map(String::as_str)
    }

    /// Saved networks ordered by generation, then rank.
    pub fn networks(&self) -> impl Iterator<Item = ((usize, usize), &str)> {
        self.networks.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, record: &GenerationRecord) -> Result<(), PersistenceError> {
        self.report = record.to_string();
        self.report_writes += 1;
        Ok(())
    }

    fn write_network(
        &mut self,
        generation: usize,
        rank: usize,
        record: &str,
    ) -> Result<(), PersistenceError> {
        self.networks.insert((generation, rank), record.to_owned());
        Ok(())
    }
}
