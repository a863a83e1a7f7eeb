#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::net::SocketAddr;

use actix_web::{App, HttpServer, middleware::Logger, web};
use tracing::info;
use watchtower::{Config, TargetService, TargetStore, open_store};

mod error;
mod response;
mod routes;

use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_config(env::var_os("WATCHTOWER_CONFIG"))?;
    let addr: SocketAddr = config.server.bind.parse()?;

    let store = TargetStore::new(open_store(&config.store).await?);
    let targets = web::Data::new(TargetService::new(store, &config.engine));

    run_server(addr, targets).await
}

async fn run_server(addr: SocketAddr, targets: web::Data<TargetService>) -> Result<(), AppError> {
    info!("Listening on http://{}", addr);

    HttpServer::new(move || {
        App::new().wrap(Logger::default()).app_data(targets.clone()).configure(routes::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
