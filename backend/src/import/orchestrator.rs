use log::{debug, info, warn};
use rundown_common::model::import::{ImportOutcome, ImportReport, ImportRowError};
use rundown_common::model::story::ApprovalStatus;
use rundown_common::model::user::Role;

use crate::auth::Actor;
use crate::error::{ParseError, RowError};

use super::normalize::{clean_cell, normalize_row, ColumnMapping};
use super::parser::{parse_csv, RawRow, UnreadableRow};
use super::store::StoryStore;
use super::validate::validate;

/// Status given to stories imported by `role`.
///
/// Bulk imports by an admin skip review; anyone else's rows wait in
/// `Pending` like a normal submission.
pub fn approval_for(role: Role) -> ApprovalStatus {
    match role {
        Role::Admin => ApprovalStatus::Approved,
        Role::Student | Role::Teacher => ApprovalStatus::Pending,
    }
}

/// Drives one CSV upload through normalize, validate and insert.
///
/// Rows are handled one at a time in file order. A row that fails for any
/// reason becomes an entry in the report and the next row is processed; only
/// an unparseable file stops the import.
pub struct Importer<S> {
    store: S,
    mapping: ColumnMapping,
    submitted_by: i64,
    status: ApprovalStatus,
}

impl<S: StoryStore> Importer<S> {
    pub fn new(store: S, actor: &Actor) -> Self {
        Importer {
            store,
            mapping: ColumnMapping::default(),
            submitted_by: actor.user_id,
            status: approval_for(actor.role),
        }
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn run(&mut self, content: &[u8]) -> Result<ImportReport, ParseError> {
        let rows = parse_csv(content)?;

        let known = self.mapping.columns();
        for name in rows.headers().names() {
            if !name.is_empty() && !known.contains(&name.as_str()) {
                warn!("Ignoring unknown column '{}'", name);
            }
        }

        let mut report = ImportReport::default();
        for row in rows {
            let outcome = match row {
                Ok(row) => self.outcome_for(&row),
                Err(UnreadableRow { number, reason }) => {
                    reject(number, None, RowError::Unreadable(reason))
                }
            };
            report.record(outcome);
        }

        info!(
            "Import finished: {} of {} rows imported as {}, {} rejected",
            report.imported,
            report.total,
            self.status,
            report.rejected()
        );
        Ok(report)
    }

    fn outcome_for(&mut self, row: &RawRow) -> ImportOutcome {
        match self.process_row(row) {
            Ok(id) => {
                debug!("Row {} imported as story {}", row.number(), id);
                ImportOutcome::Imported(id)
            }
            Err(e) => {
                let title = clean_cell(row.get(&self.mapping.title));
                let title = (!title.is_empty()).then_some(title);
                reject(row.number(), title, e)
            }
        }
    }

    /// Normalizes, validates and stores a single row.
    pub fn process_row(&mut self, row: &RawRow) -> Result<i64, RowError> {
        let normalized = normalize_row(row, &self.mapping);
        validate(&normalized)?;
        let id = self
            .store
            .insert(&normalized.story, self.status, self.submitted_by)?;
        Ok(id)
    }
}

fn reject(row: usize, title: Option<String>, error: RowError) -> ImportOutcome {
    warn!("Row {} rejected: {}", row, error);
    ImportOutcome::Rejected(ImportRowError {
        row,
        title,
        error: error.to_string(),
    })
}

/// Imports `content` on behalf of `actor` with the default column mapping.
pub fn import_csv<S: StoryStore>(
    store: S,
    actor: &Actor,
    content: &[u8],
) -> Result<ImportReport, ParseError> {
    Importer::new(store, actor).run(content)
}
