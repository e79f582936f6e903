use crate::auth::Actor;
use crate::config::Config;
use crate::error::ApiError;
use crate::import::store::list_import_batches;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    _actor: Actor,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let batches = web::block(move || -> Result<_, ApiError> {
        let conn = config.open_db()?;
        Ok(list_import_batches(&conn)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(batches))
}
