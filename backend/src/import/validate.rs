use crate::error::ValidationError;

use super::normalize::NormalizedRow;

/// Decides whether a normalized row may be stored. The first failed check
/// wins. Passing says nothing about whether the insert itself will succeed.
pub fn validate(row: &NormalizedRow) -> Result<(), ValidationError> {
    let story = &row.story;

    if story.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }

    if let Some(issue) = &row.date_issue {
        return Err(ValidationError::InvalidDate {
            column: issue.column.clone(),
            value: issue.value.clone(),
        });
    }

    if let (Some(start), Some(end)) = (story.coverage_start, story.coverage_end) {
        if end < start {
            return Err(ValidationError::InvalidCoverageRange);
        }
    }

    Ok(())
}
