use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::models::{plan::Plan, user::User};

/// Find/save access to the plan and user records owned by the backend.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_plan_by_id(&self, id: Uuid) -> Res<Option<Plan>>;

    async fn find_user_by_id(&self, id: Uuid) -> Res<Option<User>>;

    /// Users whose stored Stripe customer id matches, oldest first.
    async fn find_users_by_customer_id(&self, customer_id: &str) -> Res<Vec<User>>;

    /// Persists every mutable field of one user in a single write.
    async fn save_user(&self, user: &User) -> Res<()>;
}
