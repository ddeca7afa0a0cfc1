use actix_web::{Responder, get};
use common::{error::Res, http::Success};

use crate::dtos::health::HealthResponse;

/// Liveness probe for the billing routes.
#[get("/test")]
pub async fn get_test() -> Res<impl Responder> {
    Success::ok(HealthResponse {
        message: "Hooks are working!",
        version: env!("CARGO_PKG_VERSION"),
    })
}
