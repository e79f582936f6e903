use csv::{ReaderBuilder, Trim};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use rundown_common::model::story::{CandidateStory, MAX_QUESTIONS};
use std::collections::BTreeSet;

use super::dates::parse_date;
use super::parser::RawRow;

/// Whitespace between a separator and an opening quote, which would stop the
/// CSV reader from treating the quote as one.
static SPACE_BEFORE_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#",\s+""#).expect("valid regex"));

/// Header names the importer reads each story field from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub title: String,
    pub description: String,
    pub questions: [String; MAX_QUESTIONS],
    pub coverage_start: String,
    pub coverage_end: String,
    pub tags: String,
    pub interviewees: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            title: "idea_title".to_string(),
            description: "idea_description".to_string(),
            questions: std::array::from_fn(|i| format!("question_{}", i + 1)),
            coverage_start: "coverage_start_date".to_string(),
            coverage_end: "coverage_end_date".to_string(),
            tags: "tags".to_string(),
            interviewees: "interviewees".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Every mapped column, in template order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![self.title.as_str(), self.description.as_str()];
        columns.extend(self.questions.iter().map(String::as_str));
        columns.extend([
            self.coverage_start.as_str(),
            self.coverage_end.as_str(),
            self.tags.as_str(),
            self.interviewees.as_str(),
        ]);
        columns
    }
}

/// A date cell that could not be read, on a row where nothing else but the
/// title was filled in. Such rows go to validation instead of importing
/// without their only detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateIssue {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub story: CandidateStory,
    pub date_issue: Option<DateIssue>,
}

/// Trims a cell and folds non-breaking spaces into plain ones.
pub(crate) fn clean_cell(cell: &str) -> String {
    cell.replace('\u{00A0}', " ").trim().to_string()
}

/// Splits a multi-value cell on commas.
///
/// The cell is read as a CSV line of its own, so a value wrapped in quotes
/// (`"Smith, John", Jane Doe`) keeps its comma. Values are trimmed and empty
/// ones dropped.
pub fn split_multi_value(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Vec::new();
    }

    let cell = SPACE_BEFORE_QUOTE.replace_all(cell, ",\"");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(cell.as_bytes());

    reader
        .records()
        .filter_map(Result::ok)
        .flat_map(|record| {
            record
                .iter()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Maps one raw row onto the story shape. Never fails: date cells that do
/// not parse are dropped, or reported through `date_issue` when ambiguous.
pub fn normalize_row(row: &RawRow, mapping: &ColumnMapping) -> NormalizedRow {
    let cell = |column: &str| clean_cell(row.get(column));

    let title = cell(mapping.title.as_str());
    let description = cell(mapping.description.as_str());
    let questions: Vec<String> = mapping
        .questions
        .iter()
        .map(|column| cell(column.as_str()))
        .filter(|q| !q.is_empty())
        .collect();
    let tags: BTreeSet<String> = split_multi_value(&cell(mapping.tags.as_str()))
        .into_iter()
        .collect();
    let interviewees = split_multi_value(&cell(mapping.interviewees.as_str()));

    let mut unreadable = Vec::new();
    let mut read_date = |column: &str| {
        let raw = cell(column);
        if raw.is_empty() {
            return None;
        }
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            unreadable.push(DateIssue {
                column: column.to_string(),
                value: raw,
            });
        }
        parsed
    };
    let coverage_start = read_date(mapping.coverage_start.as_str());
    let coverage_end = read_date(mapping.coverage_end.as_str());

    let has_other_content = !description.is_empty()
        || !questions.is_empty()
        || !tags.is_empty()
        || !interviewees.is_empty()
        || coverage_start.is_some()
        || coverage_end.is_some();

    let date_issue = if !title.is_empty() && !has_other_content {
        unreadable.into_iter().next()
    } else {
        for issue in &unreadable {
            warn!(
                "Row {}: ignoring unreadable date in {}: '{}'",
                row.number(),
                issue.column,
                issue.value
            );
        }
        None
    };

    NormalizedRow {
        story: CandidateStory {
            title,
            description,
            questions,
            coverage_start,
            coverage_end,
            tags,
            interviewees,
        },
        date_issue,
    }
}
