use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TIER_FREE: &str = "free";

pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELED: &str = "canceled";
pub const STATUS_PAST_DUE: &str = "past_due";

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: String,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub usage_limit: i32,
    pub usage_count: i32,
    pub billing_period_start: Option<DateTime<Utc>>,
    pub billing_period_end: Option<DateTime<Utc>>,
    pub last_usage_reset: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh record on the free tier, as the users table defaults it.
    pub fn new_free(email: &str, usage_limit: i32) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            subscription_tier: TIER_FREE.to_string(),
            subscription_status: STATUS_INACTIVE.to_string(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            usage_limit,
            usage_count: 0,
            billing_period_start: None,
            billing_period_end: None,
            last_usage_reset: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored Stripe customer id, treating an empty column as absent.
    pub fn customer_id(&self) -> Option<&str> {
        self.stripe_customer_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}
