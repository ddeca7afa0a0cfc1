use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{env_config::Config, error::Res, http::Success};
use extractor::AuthRecord;

use crate::{dtos::portal::PortalSessionRequest, provider::BillingProvider, services};

/// Creates a Stripe billing portal session so the caller can manage an
/// existing subscription.
///
/// # Input
/// - `user`: the authenticated caller's user record; must already have a Stripe customer
/// - `req`: JSON payload with optional `returnUrl`
///
/// # Output
/// - Success: `{ "url": "https://billing.stripe.com/..." }`
/// - Error: 400 Bad Request when the caller has never completed a purchase
///   or Stripe rejects the request
#[post("/create-portal-session")]
pub async fn post_portal_session(
    AuthRecord(user): AuthRecord,
    req: web::Json<PortalSessionRequest>,
    config: web::Data<Arc<Config>>,
    provider: web::Data<Arc<dyn BillingProvider>>,
) -> Res<impl Responder> {
    let response = services::portal::create_portal_session(
        &***provider,
        &config.stripe,
        &user,
        req.into_inner(),
    )
    .await?;

    Success::ok(response)
}
