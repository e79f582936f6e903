//! HTTP endpoints for classroom stories.
//!
//! Every route requires a bearer token (see `crate::auth::Actor`).
//!
//! - `POST /api/stories/import`: multipart/form-data upload with a `file` field holding a
//!   `.csv`. The rows are run through the import pipeline synchronously and the response is
//!   the full `ImportReport` (`{ imported, total, errors }`). Admin uploads are stored as
//!   approved, everyone else's as pending. An unreadable file answers `400` with
//!   `{ "error": ... }` and imports nothing.
//!
//! - `GET /api/stories/import/template`: a header-only CSV listing the columns the importer
//!   understands.
//!
//! - `GET /api/stories/imports`: the import history, newest first.
//!
//! - `GET /api/stories?status=pending|approved`: stored stories with their tags and
//!   interviewees.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod history;
mod import;
mod list;
mod template;

const API_PATH: &str = "/api/stories";

/// Configures and returns the Actix scope for story routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/import", post().to(import::process))
        .route("/import/template", get().to(template::process))
        .route("/imports", get().to(history::process))
}
