use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Maximum number of interview questions a story carries.
pub const MAX_QUESTIONS: usize = 6;

/// A normalized story that has not been persisted yet.
///
/// Produced by the import normalizer from one CSV row. Coverage dates are
/// plain calendar dates (`YYYY-MM-DD` on the wire) so they never shift
/// across client or server timezones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStory {
    pub title: String,
    pub description: String,
    /// Up to [`MAX_QUESTIONS`] questions, blanks removed, file order kept.
    pub questions: Vec<String>,
    pub coverage_start: Option<NaiveDate>,
    pub coverage_end: Option<NaiveDate>,
    pub tags: BTreeSet<String>,
    pub interviewees: Vec<String>,
}

/// Review state of a stored story.
///
/// Stories imported by an admin land as `Approved`; everything else starts
/// as `Pending` and waits for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            other => Err(format!("unknown approval status '{}'", other)),
        }
    }
}

/// A story as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub story: CandidateStory,
    pub status: ApprovalStatus,
    pub submitted_by: i64,
    /// RFC 3339 timestamp of insertion.
    pub created_at: String,
}
