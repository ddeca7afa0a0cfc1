use std::collections::HashMap;

use common::{
    env_config::StripeConfig,
    error::{AppError, Res},
};
use db::{
    RecordStore,
    models::{plan::Plan, user::User},
};
use uuid::Uuid;

use crate::{
    dtos::checkout::{CheckoutDebug, CheckoutSessionRequest, CheckoutSessionResponse},
    provider::{BillingProvider, CheckoutSessionParams},
};

/// Price ids seeded with the plans table that never existed in Stripe.
pub const PLACEHOLDER_PRICE_IDS: &[&str] = &["price_basic_monthly", "price_pro_monthly"];

const SUCCESS_QUERY: &str = "session_id={CHECKOUT_SESSION_ID}&success=true";
const CANCEL_QUERY: &str = "canceled=true";

const PLAN_LOOKUP_FAILED: &str = "Failed to create checkout session: plan lookup failed";

pub fn is_configured_price(price_id: &str) -> bool {
    let price_id = price_id.trim();
    !price_id.is_empty() && !PLACEHOLDER_PRICE_IDS.contains(&price_id)
}

/// Appends a query string, keeping any query the caller's URL already has.
fn with_query(base: &str, query: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query)
}

pub fn success_url(base: &str) -> String {
    with_query(base, SUCCESS_QUERY)
}

pub fn cancel_url(base: &str) -> String {
    with_query(base, CANCEL_QUERY)
}

fn require_url<'a>(value: Option<&'a str>, name: &str) -> Res<&'a str> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("{} is required", name)))?;
    url::Url::parse(value)
        .map_err(|e| AppError::bad_request(format!("Invalid {}: {}", name, e)))?;
    Ok(value)
}

async fn find_plan(store: &dyn RecordStore, plan_id: &str) -> Res<Plan> {
    let Ok(id) = plan_id.parse::<Uuid>() else {
        log::info!("Plan id is not a valid record id: {}", plan_id);
        return Err(AppError::bad_request("Invalid plan ID"));
    };

    match store.find_plan_by_id(id).await {
        Ok(Some(plan)) => Ok(plan),
        Ok(None) => {
            log::info!("Plan not found: {}", plan_id);
            Err(AppError::bad_request("Invalid plan ID"))
        }
        Err(e) => {
            log::error!("Failed to load plan {}: {}", plan_id, e);
            Err(AppError::bad_request(PLAN_LOOKUP_FAILED))
        }
    }
}

/// Validates the request against the plan record and asks the provider for
/// a subscription checkout session on behalf of `user`.
pub async fn create_checkout_session(
    store: &dyn RecordStore,
    provider: &dyn BillingProvider,
    stripe: &StripeConfig,
    user: &User,
    req: CheckoutSessionRequest,
) -> Res<CheckoutSessionResponse> {
    let plan_id = req
        .plan_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("Plan ID is required"))?;

    let plan = find_plan(store, plan_id).await?;
    log::info!(
        "Plan found: {} Price ID: {}",
        plan.name,
        plan.stripe_price_id
    );

    if !is_configured_price(&plan.stripe_price_id) {
        log::warn!(
            "Invalid or placeholder Stripe price ID for plan {}: {:?}",
            plan.id,
            plan.stripe_price_id
        );
        return Err(AppError::bad_request(
            "Stripe price ID not configured for this plan. Please contact support.",
        ));
    }

    let success_base = require_url(req.success_url.as_deref(), "successUrl")?;
    let cancel_base = require_url(req.cancel_url.as_deref(), "cancelUrl")?;

    if !stripe.has_secret_key() {
        log::error!("STRIPE_SECRET_KEY is not set");
        return Err(AppError::bad_request("Stripe secret key not configured"));
    }

    let params = CheckoutSessionParams {
        price_id: plan.stripe_price_id.clone(),
        customer_email: user.email.clone(),
        success_url: success_url(success_base),
        cancel_url: cancel_url(cancel_base),
        metadata: HashMap::from([
            ("user_id".to_string(), user.id.to_string()),
            ("plan_id".to_string(), plan.id.to_string()),
            ("plan_name".to_string(), plan.name.clone()),
        ]),
    };

    let session = provider
        .create_checkout_session(&params)
        .await
        .map_err(|e| {
            log::error!("Stripe checkout error for user {}: {}", user.id, e);
            AppError::bad_request(format!("Failed to create checkout session: {}", e))
        })?;

    log::info!("Stripe session created: {}", session.id);

    let debug = provider.is_dry_run().then(|| CheckoutDebug {
        plan_name: plan.name,
        price_id: plan.stripe_price_id,
        user_email: user.email.clone(),
    });

    Ok(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
        debug,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::provider::DryRunProvider;

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn find_plan_by_id(&self, _id: Uuid) -> Res<Option<Plan>> {
            Err(AppError::Internal(
                "connection refused at 10.0.0.5:5432".to_string(),
            ))
        }

        async fn find_user_by_id(&self, _id: Uuid) -> Res<Option<User>> {
            Ok(None)
        }

        async fn find_users_by_customer_id(&self, _customer_id: &str) -> Res<Vec<User>> {
            Ok(Vec::new())
        }

        async fn save_user(&self, _user: &User) -> Res<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn store_failure_does_not_leak_cause() {
        let stripe = StripeConfig {
            secret_key: "sk_test_123".to_string(),
            webhook_secret: String::new(),
            webhook_tolerance_secs: 300,
            checkout_dry_run: false,
        };
        let user = User::new_free("a@example.com", 15);
        let req = CheckoutSessionRequest {
            plan_id: Some(Uuid::new_v4().to_string()),
            success_url: Some("https://app.example.com/billing".to_string()),
            cancel_url: Some("https://app.example.com/pricing".to_string()),
        };

        let err = create_checkout_session(&BrokenStore, &DryRunProvider, &stripe, &user, req)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(PLAN_LOOKUP_FAILED));
        assert!(!message.contains("10.0.0.5"));
    }

    #[test]
    fn placeholder_and_blank_prices_are_not_configured() {
        assert!(!is_configured_price(""));
        assert!(!is_configured_price("   "));
        assert!(!is_configured_price("price_basic_monthly"));
        assert!(!is_configured_price("price_pro_monthly"));
        assert!(is_configured_price("price_1PxYz"));
    }

    #[test]
    fn redirect_urls_carry_checkout_markers() {
        assert_eq!(
            success_url("https://app.example.com/billing"),
            "https://app.example.com/billing?session_id={CHECKOUT_SESSION_ID}&success=true"
        );
        assert_eq!(
            cancel_url("https://app.example.com/billing"),
            "https://app.example.com/billing?canceled=true"
        );
    }

    #[test]
    fn existing_query_is_extended() {
        assert_eq!(
            cancel_url("https://app.example.com/billing?tab=plans"),
            "https://app.example.com/billing?tab=plans&canceled=true"
        );
    }

    #[test]
    fn urls_must_be_present_and_absolute() {
        assert!(require_url(None, "successUrl").is_err());
        assert!(require_url(Some("  "), "successUrl").is_err());
        assert!(require_url(Some("/relative"), "successUrl").is_err());
        assert_eq!(
            require_url(Some("https://app.example.com"), "successUrl").unwrap(),
            "https://app.example.com"
        );
    }
}
