use serde::{Deserialize, Serialize};

/// One rejected CSV row in an [`ImportReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// The row's title, when it had one.
    pub title: Option<String>,
    pub error: String,
}

/// Result of pushing a single row through the import pipeline.
///
/// Exactly one outcome is produced for every row the importer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(i64),
    Rejected(ImportRowError),
}

/// Summary of one import call.
///
/// Serialized as `{ imported, total, errors: [{ row, title, error }] }`.
/// A report is built fresh for every call and handed back to the caller;
/// nothing about it outlives the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub total: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    /// Folds one row outcome into the report.
    pub fn record(&mut self, outcome: ImportOutcome) {
        self.total += 1;
        match outcome {
            ImportOutcome::Imported(_) => self.imported += 1,
            ImportOutcome::Rejected(error) => self.errors.push(error),
        }
    }

    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Audit entry written after every import call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    /// UUID of the batch.
    pub id: String,
    pub file_name: String,
    /// Hex MD5 of the uploaded bytes.
    pub file_md5: String,
    pub imported_by: i64,
    pub imported: usize,
    pub total: usize,
    pub created_at: String,
}
