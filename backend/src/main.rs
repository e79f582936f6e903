use actix_web::{web, App, HttpServer};
use clap::Parser;
use env_logger::Env;
use log::info;
use rundown_backend::config::Config;
use rundown_backend::{db, services};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::parse();

    {
        let conn = config.open_db().map_err(std::io::Error::other)?;
        db::init(&conn).map_err(std::io::Error::other)?;
    }

    let url = config.url();
    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .configure(services::configure)
    })
    .bind(bind)?
    .run()
    .await
}
