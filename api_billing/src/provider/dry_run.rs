use async_trait::async_trait;
use chrono::Utc;
use common::error::Res;

use super::{BillingProvider, CheckoutSessionParams, CreatedCheckoutSession};

pub const DRY_RUN_CHECKOUT_URL: &str = "https://checkout.stripe.com/test";
pub const DRY_RUN_PORTAL_URL: &str = "https://billing.stripe.com/test";

/// Answers with stub sessions without contacting Stripe.
/// Used to exercise the checkout flow end to end before prices exist.
pub struct DryRunProvider;

#[async_trait]
impl BillingProvider for DryRunProvider {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Res<CreatedCheckoutSession> {
        log::info!(
            "Dry run checkout for {} with price {}",
            params.customer_email,
            params.price_id
        );
        Ok(CreatedCheckoutSession {
            id: format!("test_session_{}", Utc::now().timestamp_millis()),
            url: DRY_RUN_CHECKOUT_URL.to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        _return_url: Option<&str>,
    ) -> Res<String> {
        log::info!("Dry run portal session for {}", customer_id);
        Ok(DRY_RUN_PORTAL_URL.to_string())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
