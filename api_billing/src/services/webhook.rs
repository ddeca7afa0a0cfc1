use chrono::{DateTime, Duration, Utc};
use common::{
    env_config::BillingConfig,
    error::{AppError, Res},
};
use db::{
    RecordStore,
    models::user::{STATUS_ACTIVE, STATUS_CANCELED, STATUS_PAST_DUE, TIER_FREE, User},
};
use uuid::Uuid;

use crate::{
    misc::signature,
    models::event::{
        BillingEvent, CheckoutSessionObject, InvoiceObject, SubscriptionObject, WebhookEvent,
    },
};

/// Verifies the signature header over the raw payload and decodes the event.
pub fn construct_event(
    payload: &[u8],
    signature_header: Option<&str>,
    webhook_secret: &str,
    tolerance_secs: i64,
) -> Res<WebhookEvent> {
    let now = Utc::now().timestamp();
    if let Err(e) = signature::verify_signature(
        payload,
        signature_header,
        webhook_secret,
        now,
        tolerance_secs,
    ) {
        log::warn!("Webhook signature verification failed: {}", e);
        return Err(AppError::bad_request("Invalid signature"));
    }

    serde_json::from_slice::<WebhookEvent>(payload).map_err(|e| {
        log::error!("Error decoding webhook event: {}", e);
        AppError::bad_request("Invalid payload")
    })
}

/// Applies a verified event to the user records.
///
/// Failures are logged and swallowed: a verified webhook is always
/// acknowledged so Stripe does not retry it.
pub async fn process_webhook_event(
    store: &dyn RecordStore,
    billing: &BillingConfig,
    event: WebhookEvent,
    now: DateTime<Utc>,
) {
    let event_id = event.id.clone().unwrap_or_default();
    let event_type = event.event_type.clone();
    log::info!("Webhook verified: {} ({})", event_type, event_id);

    let event = match BillingEvent::try_from(event) {
        Ok(event) => event,
        Err(e) => {
            log::error!("Error processing webhook {}: malformed object: {}", event_type, e);
            return;
        }
    };

    let result = match event {
        BillingEvent::CheckoutSessionCompleted(session) => {
            handle_checkout_completed(store, billing, &session, now).await
        }
        BillingEvent::SubscriptionUpdated(subscription) => {
            handle_subscription_updated(store, &subscription).await
        }
        BillingEvent::SubscriptionDeleted(subscription) => {
            handle_subscription_deleted(store, billing, &subscription).await
        }
        BillingEvent::InvoicePaymentSucceeded(invoice) => {
            handle_payment_succeeded(store, &invoice, now).await
        }
        BillingEvent::InvoicePaymentFailed(invoice) => handle_payment_failed(store, &invoice).await,
        BillingEvent::Unhandled(event_type) => {
            log::info!("Unhandled event type: {}", event_type);
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("Error processing webhook {} ({}): {}", event_type, event_id, e);
    }
}

/// First user whose stored Stripe customer id matches. Further matches are
/// reported and ignored.
async fn find_user_by_customer(store: &dyn RecordStore, customer_id: &str) -> Res<Option<User>> {
    let users = store.find_users_by_customer_id(customer_id).await?;
    if users.len() > 1 {
        log::warn!(
            "{} users share customer {}; updating the oldest",
            users.len(),
            customer_id
        );
    }
    let user = users.into_iter().next();
    if user.is_none() {
        log::info!("No user found for customer: {}", customer_id);
    }
    Ok(user)
}

fn parse_record_id(value: &str, what: &str) -> Option<Uuid> {
    match value.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(_) => {
            log::error!("Checkout metadata {} is not a record id: {}", what, value);
            None
        }
    }
}

pub async fn handle_checkout_completed(
    store: &dyn RecordStore,
    billing: &BillingConfig,
    session: &CheckoutSessionObject,
    now: DateTime<Utc>,
) -> Res<()> {
    log::info!("Processing checkout completed for session: {}", session.id);

    let (Some(user_id), Some(plan_id)) = (
        session.metadata_value("user_id"),
        session.metadata_value("plan_id"),
    ) else {
        log::error!("Missing metadata in checkout session {}", session.id);
        return Ok(());
    };
    let (Some(user_id), Some(plan_id)) = (
        parse_record_id(user_id, "user_id"),
        parse_record_id(plan_id, "plan_id"),
    ) else {
        return Ok(());
    };

    let Some(plan) = store.find_plan_by_id(plan_id).await? else {
        log::error!("Plan not found: {}", plan_id);
        return Ok(());
    };
    let Some(mut user) = store.find_user_by_id(user_id).await? else {
        log::error!("User not found: {}", user_id);
        return Ok(());
    };

    user.subscription_tier = plan.name.to_lowercase();
    user.subscription_status = STATUS_ACTIVE.to_string();
    user.stripe_customer_id = session.customer.clone();
    user.stripe_subscription_id = session.subscription.clone();
    user.usage_limit = plan.usage_limit;
    user.usage_count = 0;
    user.billing_period_start = Some(now);
    user.billing_period_end = Some(now + Duration::days(billing.billing_period_days));
    user.last_usage_reset = Some(now);

    store.save_user(&user).await?;
    log::info!("User subscription updated successfully: {}", user.email);
    Ok(())
}

pub async fn handle_subscription_updated(
    store: &dyn RecordStore,
    subscription: &SubscriptionObject,
) -> Res<()> {
    log::info!("Processing subscription updated: {}", subscription.id);

    let Some(mut user) = find_user_by_customer(store, &subscription.customer).await? else {
        return Ok(());
    };

    user.subscription_status = subscription.status.clone();
    user.stripe_subscription_id = Some(subscription.id.clone());
    if let Some(start) = subscription
        .current_period_start
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        user.billing_period_start = Some(start);
    }
    if let Some(end) = subscription
        .current_period_end
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        user.billing_period_end = Some(end);
    }

    store.save_user(&user).await?;
    log::info!("Subscription updated for user: {}", user.email);
    Ok(())
}

pub async fn handle_subscription_deleted(
    store: &dyn RecordStore,
    billing: &BillingConfig,
    subscription: &SubscriptionObject,
) -> Res<()> {
    log::info!("Processing subscription deleted: {}", subscription.id);

    let Some(mut user) = find_user_by_customer(store, &subscription.customer).await? else {
        return Ok(());
    };

    user.subscription_tier = TIER_FREE.to_string();
    user.subscription_status = STATUS_CANCELED.to_string();
    user.usage_limit = billing.free_tier_usage_limit;

    store.save_user(&user).await?;
    log::info!("Subscription canceled for user: {}", user.email);
    Ok(())
}

pub async fn handle_payment_succeeded(
    store: &dyn RecordStore,
    invoice: &InvoiceObject,
    now: DateTime<Utc>,
) -> Res<()> {
    log::info!(
        "Processing payment succeeded for invoice: {}",
        invoice.id.as_deref().unwrap_or("?")
    );

    let Some(customer) = invoice.customer.as_deref() else {
        log::info!("Invoice has no customer, nothing to reset");
        return Ok(());
    };
    let Some(mut user) = find_user_by_customer(store, customer).await? else {
        return Ok(());
    };

    user.usage_count = 0;
    user.last_usage_reset = Some(now);

    store.save_user(&user).await?;
    log::info!("Usage reset for user: {}", user.email);
    Ok(())
}

pub async fn handle_payment_failed(store: &dyn RecordStore, invoice: &InvoiceObject) -> Res<()> {
    log::info!(
        "Processing payment failed for invoice: {}",
        invoice.id.as_deref().unwrap_or("?")
    );

    let Some(customer) = invoice.customer.as_deref() else {
        log::info!("Invoice has no customer, nothing to mark");
        return Ok(());
    };
    let Some(mut user) = find_user_by_customer(store, customer).await? else {
        return Ok(());
    };

    user.subscription_status = STATUS_PAST_DUE.to_string();

    store.save_user(&user).await?;
    log::info!("Subscription marked past_due for user: {}", user.email);
    Ok(())
}
