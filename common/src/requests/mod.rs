use crate::model::story::ApprovalStatus;
use serde::Deserialize;

/// Query string for the story listing endpoint.
/// Without a status every stored story is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ListStoriesQuery {
    pub status: Option<ApprovalStatus>,
}
