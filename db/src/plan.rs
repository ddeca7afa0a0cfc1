use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::plan::Plan;

pub async fn get_plan_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
) -> Res<Option<Plan>> {
    sqlx::query_as::<_, Plan>(
        "SELECT id, name, stripe_price_id, usage_limit FROM subscription_plans WHERE id = $1",
    )
    .bind(plan_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
