//! Story persistence.
//!
//! `StoryStore` is the seam the importer writes through. `SqliteStoryStore`
//! is the production implementation; each insert is its own transaction, so
//! a row that fails leaves nothing behind while earlier rows stay committed.
//! The read helpers below back the listing and history endpoints.

use chrono::{NaiveDate, Utc};
use rundown_common::model::import::ImportBatch;
use rundown_common::model::story::{ApprovalStatus, CandidateStory, StoryRecord};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::error::PersistenceError;

pub trait StoryStore {
    /// Inserts one story and returns its id.
    fn insert(
        &mut self,
        story: &CandidateStory,
        status: ApprovalStatus,
        submitted_by: i64,
    ) -> Result<i64, PersistenceError>;
}

impl<S: StoryStore + ?Sized> StoryStore for &mut S {
    fn insert(
        &mut self,
        story: &CandidateStory,
        status: ApprovalStatus,
        submitted_by: i64,
    ) -> Result<i64, PersistenceError> {
        (**self).insert(story, status, submitted_by)
    }
}

pub struct SqliteStoryStore<'c> {
    conn: &'c mut Connection,
}

impl<'c> SqliteStoryStore<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        SqliteStoryStore { conn }
    }
}

impl StoryStore for SqliteStoryStore<'_> {
    fn insert(
        &mut self,
        story: &CandidateStory,
        status: ApprovalStatus,
        submitted_by: i64,
    ) -> Result<i64, PersistenceError> {
        let questions = serde_json::to_string(&story.questions)?;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO stories (title, description, questions, coverage_start, coverage_end, status, submitted_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                story.title,
                story.description,
                questions,
                story.coverage_start,
                story.coverage_end,
                status.as_str(),
                submitted_by,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut insert_tag =
                tx.prepare("INSERT INTO story_tags (story_id, tag) VALUES (?1, ?2)")?;
            for tag in &story.tags {
                insert_tag.execute(params![id, tag])?;
            }

            let mut insert_interviewee = tx.prepare(
                "INSERT INTO story_interviewees (story_id, position, name) VALUES (?1, ?2, ?3)",
            )?;
            for (position, name) in story.interviewees.iter().enumerate() {
                insert_interviewee.execute(params![id, position as i64, name])?;
            }
        }

        tx.commit()?;
        Ok(id)
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Reads stored stories, oldest first, optionally filtered by status.
pub fn load_stories(
    conn: &Connection,
    status: Option<ApprovalStatus>,
) -> Result<Vec<StoryRecord>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, questions, coverage_start, coverage_end, status, submitted_by, created_at
         FROM stories
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY id",
    )?;

    let rows = stmt.query_map(params![status.map(|s| s.as_str())], |row| {
        let questions: String = row.get(3)?;
        let questions: Vec<String> =
            serde_json::from_str(&questions).map_err(|e| conversion_error(3, e.to_string()))?;
        let status: String = row.get(6)?;
        let status = status
            .parse::<ApprovalStatus>()
            .map_err(|e| conversion_error(6, e))?;

        Ok(StoryRecord {
            id: row.get(0)?,
            story: CandidateStory {
                title: row.get(1)?,
                description: row.get(2)?,
                questions,
                coverage_start: row.get::<_, Option<NaiveDate>>(4)?,
                coverage_end: row.get::<_, Option<NaiveDate>>(5)?,
                tags: Default::default(),
                interviewees: Vec::new(),
            },
            status,
            submitted_by: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;
    let mut records = rows.collect::<Result<Vec<_>, _>>()?;

    let mut tags = conn.prepare("SELECT tag FROM story_tags WHERE story_id = ?1")?;
    let mut interviewees = conn.prepare(
        "SELECT name FROM story_interviewees WHERE story_id = ?1 ORDER BY position",
    )?;
    for record in &mut records {
        record.story.tags = tags
            .query_map(params![record.id], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;
        record.story.interviewees = interviewees
            .query_map(params![record.id], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;
    }

    Ok(records)
}

pub fn record_import_batch(conn: &Connection, batch: &ImportBatch) -> Result<(), PersistenceError> {
    conn.execute(
        "INSERT INTO import_batches (id, file_name, file_md5, imported_by, imported, total, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            batch.id,
            batch.file_name,
            batch.file_md5,
            batch.imported_by,
            batch.imported as i64,
            batch.total as i64,
            batch.created_at,
        ],
    )?;
    Ok(())
}

/// Import history, newest first.
pub fn list_import_batches(conn: &Connection) -> Result<Vec<ImportBatch>, PersistenceError> {
    let mut stmt = conn.prepare(
        "SELECT id, file_name, file_md5, imported_by, imported, total, created_at
         FROM import_batches
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let batches = stmt
        .query_map([], |row| {
            Ok(ImportBatch {
                id: row.get(0)?,
                file_name: row.get(1)?,
                file_md5: row.get(2)?,
                imported_by: row.get(3)?,
                imported: row.get::<_, i64>(4)? as usize,
                total: row.get::<_, i64>(5)? as usize,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(batches)
}
