use std::collections::HashMap;

use serde::Deserialize;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CUSTOMER_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const CUSTOMER_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// Envelope of a Stripe webhook event. The object stays untyped until the
/// event type says which shape to expect.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSessionObject {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

/// Webhook events this service reacts to.
#[derive(Debug, Clone)]
pub enum BillingEvent {
    CheckoutSessionCompleted(CheckoutSessionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    InvoicePaymentSucceeded(InvoiceObject),
    InvoicePaymentFailed(InvoiceObject),
    Unhandled(String),
}

impl TryFrom<WebhookEvent> for BillingEvent {
    type Error = serde_json::Error;

    fn try_from(event: WebhookEvent) -> Result<Self, Self::Error> {
        let object = event.data.object;
        let parsed = match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                BillingEvent::CheckoutSessionCompleted(serde_json::from_value(object)?)
            }
            CUSTOMER_SUBSCRIPTION_UPDATED => {
                BillingEvent::SubscriptionUpdated(serde_json::from_value(object)?)
            }
            CUSTOMER_SUBSCRIPTION_DELETED => {
                BillingEvent::SubscriptionDeleted(serde_json::from_value(object)?)
            }
            INVOICE_PAYMENT_SUCCEEDED => {
                BillingEvent::InvoicePaymentSucceeded(serde_json::from_value(object)?)
            }
            INVOICE_PAYMENT_FAILED => {
                BillingEvent::InvoicePaymentFailed(serde_json::from_value(object)?)
            }
            _ => BillingEvent::Unhandled(event.event_type),
        };
        Ok(parsed)
    }
}
