use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{plan::Plan, user::User},
    plan, user,
    store::RecordStore,
};

/// Record store backed by the Postgres pool from [`crate::setup`].
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_plan_by_id(&self, id: Uuid) -> Res<Option<Plan>> {
        plan::get_plan_by_id(&*self.pool, id).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Res<Option<User>> {
        user::get_user_by_id(&*self.pool, id).await
    }

    async fn find_users_by_customer_id(&self, customer_id: &str) -> Res<Vec<User>> {
        user::get_users_by_customer_id(&*self.pool, customer_id).await
    }

    async fn save_user(&self, user: &User) -> Res<()> {
        user::update_user(&*self.pool, user).await
    }
}
