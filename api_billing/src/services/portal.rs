use common::{
    env_config::StripeConfig,
    error::{AppError, Res},
};
use db::models::user::User;

use crate::{
    dtos::portal::{PortalSessionRequest, PortalSessionResponse},
    provider::BillingProvider,
};

/// Opens a billing portal session for a user who already has a Stripe customer.
pub async fn create_portal_session(
    provider: &dyn BillingProvider,
    stripe: &StripeConfig,
    user: &User,
    req: PortalSessionRequest,
) -> Res<PortalSessionResponse> {
    let customer_id = user.customer_id().ok_or_else(|| {
        AppError::bad_request("No Stripe customer ID found. Please complete a purchase first.")
    })?;

    if !stripe.has_secret_key() {
        log::error!("STRIPE_SECRET_KEY is not set");
        return Err(AppError::bad_request("Stripe secret key not configured"));
    }

    let return_url = req
        .return_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    let url = provider
        .create_portal_session(customer_id, return_url)
        .await
        .map_err(|e| {
            log::error!("Stripe portal error for user {}: {}", user.id, e);
            AppError::bad_request(format!("Failed to create portal session: {}", e))
        })?;

    Ok(PortalSessionResponse { url })
}
