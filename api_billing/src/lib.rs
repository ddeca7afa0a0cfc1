use actix_web::web::{self};
use common::error::AppError;

pub mod routes {
    pub mod checkout;
    pub mod health;
    pub mod portal;
    pub mod webhook;
}

pub mod services {
    pub mod checkout;
    pub mod portal;
    pub mod webhook;
}

pub mod dtos {
    pub mod checkout;
    pub mod health;
    pub mod portal;
    pub mod webhook;
}

pub mod models {
    pub mod event;
}

pub mod misc {
    pub mod signature;
}

pub mod provider;

/// Malformed JSON bodies are reported like every other caller error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::bad_request(err.to_string()).into())
}

pub fn mount_stripe() -> actix_web::Scope {
    web::scope("/stripe")
        .app_data(json_config())
        .service(routes::checkout::post_checkout_session)
        .service(routes::portal::post_portal_session)
        .service(routes::webhook::post_webhook)
}

/// Registers the probe and the Stripe scope on the enclosing `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::health::get_test).service(mount_stripe());
}
