use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use log::{info, warn};
use md5::Context;
use rundown_common::model::import::{ImportBatch, ImportReport};

use crate::auth::Actor;
use crate::config::Config;
use crate::error::ApiError;
use crate::import::store::record_import_batch;
use crate::import::{import_csv, SqliteStoryStore};

/// An uploaded CSV held in memory together with its fingerprint.
struct CsvUpload {
    file_name: String,
    bytes: Vec<u8>,
    md5: String,
}

/// HTTP handler wrapper that converts the import result to an `HttpResponse`.
///
/// - On success: returns `200 OK` with the `ImportReport` as JSON, whatever share of the
///   rows made it in.
/// - On a bad upload or an unparseable file: returns `400 Bad Request` with the reason.
pub async fn process(
    actor: Actor,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let report = import_stories(actor, config, payload).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Reads the upload, then runs the whole import on the blocking pool.
///
/// The response is only produced once every row has been handled. Rows that were
/// stored stay stored if the client goes away halfway.
pub async fn import_stories(
    actor: Actor,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<ImportReport, ApiError> {
    let upload = read_csv_upload(payload, config.max_upload_bytes).await?;
    info!(
        "User {} ({}) importing '{}' ({} bytes, md5 {})",
        actor.user_id,
        actor.role,
        upload.file_name,
        upload.bytes.len(),
        upload.md5
    );

    web::block(move || run_import(&config, &actor, &upload)).await?
}

async fn read_csv_upload(mut payload: Multipart, limit: usize) -> Result<CsvUpload, ApiError> {
    let mut upload: Option<CsvUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if field_name.as_deref() != Some("file") {
            continue;
        }
        if upload.is_some() {
            return Err(ApiError::BadRequest(
                "Only one file may be uploaded per import".to_string(),
            ));
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();

        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(ApiError::BadRequest("The file must end with .csv".to_string()));
        }

        let mut md5_hasher = Context::new();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > limit {
                return Err(ApiError::BadRequest(format!(
                    "The file is larger than {} bytes",
                    limit
                )));
            }
            md5_hasher.consume(&chunk);
            bytes.extend_from_slice(&chunk);
        }

        upload = Some(CsvUpload {
            file_name,
            bytes,
            md5: format!("{:x}", md5_hasher.finalize()),
        });
    }

    upload.ok_or_else(|| ApiError::BadRequest("Missing file".to_string()))
}

fn run_import(config: &Config, actor: &Actor, upload: &CsvUpload) -> Result<ImportReport, ApiError> {
    let mut conn = config.open_db()?;
    let report = import_csv(SqliteStoryStore::new(&mut conn), actor, &upload.bytes)?;

    let batch = ImportBatch {
        id: uuid::Uuid::new_v4().to_string(),
        file_name: upload.file_name.clone(),
        file_md5: upload.md5.clone(),
        imported_by: actor.user_id,
        imported: report.imported,
        total: report.total,
        created_at: Utc::now().to_rfc3339(),
    };
    // The stories are already committed; a missing audit row must not hide the report.
    if let Err(e) = record_import_batch(&conn, &batch) {
        warn!("Could not record import batch {}: {}", batch.id, e);
    }

    Ok(report)
}
