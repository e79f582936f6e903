use crate::auth::Actor;
use crate::config::Config;
use crate::error::ApiError;
use crate::import::store::load_stories;
use actix_web::{web, HttpResponse};
use rundown_common::requests::ListStoriesQuery;

pub(crate) async fn process(
    _actor: Actor,
    config: web::Data<Config>,
    query: web::Query<ListStoriesQuery>,
) -> Result<HttpResponse, ApiError> {
    let status = query.into_inner().status;
    let stories = web::block(move || -> Result<_, ApiError> {
        let conn = config.open_db()?;
        Ok(load_stories(&conn, status)?)
    })
    .await??;
    Ok(HttpResponse::Ok().json(stories))
}
