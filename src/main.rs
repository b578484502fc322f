// src/main.rs
use actix_files::Files; // Static front end
use actix_web::{App, HttpServer}; // HTTP server
use double_pendulum_sim::{config, ui}; // Routes and bind address
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = config::bind_addr();
    info!(%addr, "Starting double pendulum server");

    HttpServer::new(|| {
        App::new()
            .configure(ui::configure)
            .service(Files::new("/", "./static").index_file("index.html"))
    })
    .bind(addr)?
    .run()
    .await
}
