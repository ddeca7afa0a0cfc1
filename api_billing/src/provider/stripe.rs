use async_trait::async_trait;
use common::error::{AppError, Res};
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client, CreateBillingPortalSession,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CustomerId,
};

use super::{BillingProvider, CheckoutSessionParams, CreatedCheckoutSession};

/// Provider backed by the Stripe API.
pub struct StripeProvider {
    client: Client,
}

impl StripeProvider {
    pub fn new(secret_key: &str) -> Self {
        StripeProvider {
            client: common::stripe::create_client(secret_key),
        }
    }
}

#[async_trait]
impl BillingProvider for StripeProvider {
    /// Creates a subscription-mode checkout session for a single price.
    async fn create_checkout_session(
        &self,
        req: &CheckoutSessionParams,
    ) -> Res<CreatedCheckoutSession> {
        let params = CreateCheckoutSession {
            customer_email: Some(req.customer_email.as_str()),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(req.price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }]),
            mode: Some(CheckoutSessionMode::Subscription),
            success_url: Some(req.success_url.as_str()),
            cancel_url: Some(req.cancel_url.as_str()),
            metadata: Some(req.metadata.clone()),
            ..Default::default()
        };

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(AppError::from)?;

        let url = session.url.ok_or_else(|| {
            AppError::Internal(format!("Checkout session {} has no url", session.id))
        })?;

        Ok(CreatedCheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: Option<&str>,
    ) -> Res<String> {
        let customer = customer_id.parse::<CustomerId>().map_err(|e| {
            AppError::BadRequest(format!("Invalid customer id: {}. {}", customer_id, e))
        })?;

        let mut params = CreateBillingPortalSession::new(customer);
        params.return_url = return_url;

        BillingPortalSession::create(&self.client, params)
            .await
            .map(|session| session.url)
            .map_err(AppError::from)
    }
}
