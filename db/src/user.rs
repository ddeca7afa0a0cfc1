use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::user::User;

const USER_COLUMNS: &str = r#"
    id, email, subscription_tier, subscription_status,
    stripe_customer_id, stripe_subscription_id,
    usage_limit, usage_count,
    billing_period_start, billing_period_end, last_usage_reset,
    created_at, updated_at
"#;

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_users_by_customer_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_id: &str,
) -> Res<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE stripe_customer_id = $1 ORDER BY created_at ASC",
        USER_COLUMNS
    ))
    .bind(customer_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user: &User,
) -> Res<()> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            subscription_tier = $2,
            subscription_status = $3,
            stripe_customer_id = $4,
            stripe_subscription_id = $5,
            usage_limit = $6,
            usage_count = $7,
            billing_period_start = $8,
            billing_period_end = $9,
            last_usage_reset = $10,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(&user.subscription_tier)
    .bind(&user.subscription_status)
    .bind(&user.stripe_customer_id)
    .bind(&user.stripe_subscription_id)
    .bind(user.usage_limit)
    .bind(user.usage_count)
    .bind(user.billing_period_start)
    .bind(user.billing_period_end)
    .bind(user.last_usage_reset)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("user {}", user.id)));
    }
    Ok(())
}
