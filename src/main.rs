use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use paygate_backend::config::Config;
use paygate_backend::db::Database;
use paygate_backend::queue::Queue;
use paygate_backend::{api, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    db.run_migrations().await.expect("failed to run migrations");

    let queue = Queue::new(db.pool.clone());

    let state = web::Data::new(AppState {
        db: Arc::new(db),
        queue: Arc::new(queue),
        config: Arc::new(config.clone()),
    });

    info!(host = %config.host, port = config.port, "starting paygate-api");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(actix_middleware::Logger::default())
            .wrap(actix_middleware::NormalizePath::trim())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
