//! Types shared between the rundown backend and its clients.
//!
//! Everything in here is plain data: the story shape produced by the CSV
//! import pipeline, the import report returned to callers, user roles and
//! the query payloads accepted by the HTTP API.

pub mod model;
pub mod requests;
