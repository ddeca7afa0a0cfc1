use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    models::{plan::Plan, user::User},
    store::RecordStore,
};

/// Plans seeded by the initial migration.
const SEED_PLANS: &[(&str, &str, i32)] = &[
    ("Basic", "price_basic_monthly", 100),
    ("Pro", "price_pro_monthly", 1000),
];

/// In-process record store for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    plans: DashMap<Uuid, Plan>,
    users: DashMap<Uuid, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the same plans the Postgres migration seeds. Users are
    /// not seeded, so authenticated routes only work for users inserted
    /// through [`MemoryStore::insert_user`].
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, price_id, usage_limit) in SEED_PLANS {
            let plan = Plan {
                id: Uuid::new_v4(),
                name: name.to_string(),
                stripe_price_id: price_id.to_string(),
                usage_limit: *usage_limit,
            };
            log::info!("Seeded plan {} ({})", plan.name, plan.id);
            store.insert_plan(plan);
        }
        store
    }

    pub fn insert_plan(&self, plan: Plan) {
        self.plans.insert(plan.id, plan);
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn plans(&self) -> Vec<Plan> {
        self.plans.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_plan_by_id(&self, id: Uuid) -> Res<Option<Plan>> {
        Ok(self.plans.get(&id).map(|plan| plan.value().clone()))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Res<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn find_users_by_customer_id(&self, customer_id: &str) -> Res<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.stripe_customer_id.as_deref() == Some(customer_id))
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn save_user(&self, user: &User) -> Res<()> {
        match self.users.get_mut(&user.id) {
            Some(mut stored) => {
                *stored = user.clone();
                stored.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("user {}", user.id))),
        }
    }
}
