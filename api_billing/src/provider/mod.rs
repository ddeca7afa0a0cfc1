use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use common::{env_config::StripeConfig, error::Res};

pub mod dry_run;
pub mod stripe;

pub use dry_run::DryRunProvider;
pub use self::stripe::StripeProvider;

/// Everything the provider needs to open a subscription checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionParams {
    pub price_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedCheckoutSession {
    pub id: String,
    pub url: String,
}

/// Hosted-session API of the billing provider.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Res<CreatedCheckoutSession>;

    /// Returns the URL of a billing portal session for an existing customer.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: Option<&str>,
    ) -> Res<String>;

    /// Stub providers report themselves so routes can attach debug output.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Picks the provider the configuration asks for.
pub fn from_config(stripe: &StripeConfig) -> Arc<dyn BillingProvider> {
    if stripe.checkout_dry_run {
        log::warn!("STRIPE_CHECKOUT_DRY_RUN is on; checkout sessions are stubs");
        Arc::new(DryRunProvider)
    } else {
        Arc::new(StripeProvider::new(&stripe.secret_key))
    }
}
