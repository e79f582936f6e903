pub mod stories;

use actix_web::web;

/// Registers every API scope on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(stories::configure_routes());
}
