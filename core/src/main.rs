mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use common::env_config::{Config, RecordStoreKind};
use db::{MemoryStore, PgStore, RecordStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup(&config.log_file).expect("Failed to set up logger");
    }

    // init record store
    let store: Arc<dyn RecordStore> = match config.record_store {
        RecordStoreKind::Postgres => {
            let pool = db::setup(&config.database_url, config.is_production())
                .await
                .expect("Failed to set up database");
            Arc::new(PgStore::new(pool))
        }
        RecordStoreKind::Memory => {
            log::warn!("Using the in-memory record store; records are lost on restart");
            Arc::new(MemoryStore::seeded())
        }
    };

    if !config.stripe.has_secret_key() {
        log::warn!("STRIPE_SECRET_KEY is not set; checkout and portal requests will fail");
    }
    if !config.stripe.has_webhook_secret() {
        log::warn!("STRIPE_WEBHOOK_SECRET is not set; webhooks will be rejected");
    }
    let provider = api_billing::provider::from_config(&config.stripe);

    log::info!(
        "Starting billing server on {}:{}",
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(provider.clone()))
            .wrap(logger::middleware()) // 3rd
            .wrap(extractor::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(web::scope("/api").configure(api_billing::configure))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
