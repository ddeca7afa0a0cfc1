use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use chrono::Utc;
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
};
use db::RecordStore;

use crate::{dtos::webhook::WebhookResponse, misc::signature::SIGNATURE_HEADER, services};

/// Handles Stripe webhook events for subscription state.
///
/// # Input
/// - `payload`: raw request body, verified byte for byte
/// - `req`: HTTP request carrying the `Stripe-Signature` header
///
/// # Output
/// - Success: 200 `{ "received": true }` once the signature checks out, even
///   if applying the event fails (Stripe would otherwise keep retrying)
/// - Error: 400 Bad Request when Stripe is not configured, the signature is
///   invalid, or the body is not an event
///
/// # Note
/// This endpoint is called by Stripe, not by the frontend. Point a webhook
/// endpoint in the Stripe Dashboard at `https://yourapp.com/api/stripe/webhook`
/// and set its signing secret as STRIPE_WEBHOOK_SECRET.
///
/// # Event Types Handled
/// - checkout.session.completed: activates the purchased plan
/// - customer.subscription.updated: syncs status and billing period
/// - customer.subscription.deleted: drops the user back to the free tier
/// - invoice.payment_succeeded: resets the usage counter
/// - invoice.payment_failed: marks the subscription past_due
#[post("/webhook")]
pub async fn post_webhook(
    payload: web::Bytes,
    req: HttpRequest,
    config: web::Data<Arc<Config>>,
    store: web::Data<Arc<dyn RecordStore>>,
) -> Res<impl Responder> {
    log::info!("Received Stripe webhook");

    if !config.stripe.has_secret_key() || !config.stripe.has_webhook_secret() {
        log::error!("Missing Stripe configuration");
        return Err(AppError::bad_request("Stripe not properly configured"));
    }

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = services::webhook::construct_event(
        &payload,
        signature,
        &config.stripe.webhook_secret,
        config.stripe.webhook_tolerance_secs,
    )?;

    services::webhook::process_webhook_event(&***store, &config.billing, event, Utc::now()).await;

    Success::ok(WebhookResponse { received: true })
}
