//! Types for the batch module.

use serde::Serialize;
use std::path::PathBuf;

/// One successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputRecord {
    /// The input the record was produced from.
    pub input: PathBuf,
    /// The converted file.
    pub path: PathBuf,
    /// Size of the converted file in bytes (always non-zero).
    pub size_bytes: u64,
}

/// All outputs of a fully successful batch run.
///
/// Records are in completion order, not input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    records: Vec<OutputRecord>,
}

impl BatchResult {
    pub(crate) fn new(records: Vec<OutputRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all output sizes.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    /// Records ordered by output path, for display and deterministic tests.
    pub fn sorted_by_path(&self) -> Vec<&OutputRecord> {
        let mut sorted: Vec<&OutputRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        sorted
    }
}
