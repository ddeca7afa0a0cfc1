use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{env_config::Config, error::Res, http::Success};
use db::RecordStore;
use extractor::AuthRecord;

use crate::{dtos::checkout::CheckoutSessionRequest, provider::BillingProvider, services};

/// Creates a Stripe checkout session for one of the subscription plans.
///
/// # Input
/// - `user`: the authenticated caller's user record
/// - `req`: JSON payload
///   - `planId`: id of a `subscription_plans` record
///   - `successUrl`: where Stripe redirects after payment
///   - `cancelUrl`: where Stripe redirects when the customer backs out
///
/// # Output
/// - Success: `{ "sessionId": "cs_...", "url": "https://checkout.stripe.com/..." }`
/// - Error: 400 Bad Request with `{ "error": "<reason>" }` for a missing caller,
///   unknown plan, unconfigured price, or any Stripe failure
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/stripe/create-checkout-session', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${token}`
///   },
///   body: JSON.stringify({
///     planId: plan.id,
///     successUrl: `${window.location.origin}/billing`,
///     cancelUrl: `${window.location.origin}/billing`
///   })
/// });
///
/// if (response.ok) {
///   const { url } = await response.json();
///   window.location.href = url;
/// }
/// ```
#[post("/create-checkout-session")]
pub async fn post_checkout_session(
    AuthRecord(user): AuthRecord,
    req: web::Json<CheckoutSessionRequest>,
    config: web::Data<Arc<Config>>,
    store: web::Data<Arc<dyn RecordStore>>,
    provider: web::Data<Arc<dyn BillingProvider>>,
) -> Res<impl Responder> {
    log::info!("Creating Stripe checkout session for {}", user.email);

    let response = services::checkout::create_checkout_session(
        &***store,
        &***provider,
        &config.stripe,
        &user,
        req.into_inner(),
    )
    .await?;

    Success::ok(response)
}
