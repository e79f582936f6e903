use actix_web::http::header;
use actix_web::HttpResponse;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::import::ColumnMapping;

const TEMPLATE_FILE_NAME: &str = "story_import_template.csv";

pub async fn process(_actor: Actor) -> Result<HttpResponse, ApiError> {
    let body = template_csv(&ColumnMapping::default())?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", TEMPLATE_FILE_NAME),
        ))
        .body(body))
}

/// A CSV holding only the header row the importer expects.
pub fn template_csv(mapping: &ColumnMapping) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(mapping.columns())
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(e.to_string()))
}
