//! Usage service - API customers, usage logs and spend totals.

use crate::{
    db::DbPool,
    error::AppError,
    models::usage::{ApiCustomer, UsageLog, UsageTotals},
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Fetch the customer for a wallet, creating it on first sight.
///
/// Runs as a single upsert so concurrent first payments from the same wallet
/// resolve to one row.
pub async fn get_or_create_customer(
    pool: &DbPool,
    wallet_address: &str,
) -> Result<ApiCustomer, AppError> {
    let customer = sqlx::query_as::<_, ApiCustomer>(
        r#"
        INSERT INTO api_customers (wallet_address)
        VALUES ($1)
        ON CONFLICT (wallet_address) DO UPDATE SET wallet_address = EXCLUDED.wallet_address
        RETURNING *
        "#,
    )
    .bind(wallet_address)
    .fetch_one(pool)
    .await?;

    Ok(customer)
}

/// Find an existing customer by wallet.
pub async fn find_customer(
    pool: &DbPool,
    wallet_address: &str,
) -> Result<Option<ApiCustomer>, AppError> {
    let customer =
        sqlx::query_as::<_, ApiCustomer>("SELECT * FROM api_customers WHERE wallet_address = $1")
            .bind(wallet_address)
            .fetch_optional(pool)
            .await?;

    Ok(customer)
}

/// Record one paid call.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Insert the usage log
/// 3. Bump the customer's `total_spent` and `last_used_at`
/// 4. Commit
///
/// # Errors
///
/// - `Conflict`: `payment_hash` was already redeemed
/// - `Database`: database error occurred
pub async fn log_usage(
    pool: &DbPool,
    customer_id: Uuid,
    plan_id: Uuid,
    amount: Decimal,
    payment_hash: Option<&str>,
    api_endpoint: Option<&str>,
) -> Result<UsageLog, AppError> {
    let mut tx = pool.begin().await?;

    let log = sqlx::query_as::<_, UsageLog>(
        r#"
        INSERT INTO usage_logs (customer_id, plan_id, amount, payment_intent_hash, api_endpoint)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .bind(plan_id)
    .bind(amount)
    .bind(payment_hash)
    .bind(api_endpoint)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            AppError::Conflict("Payment has already been redeemed".to_string())
        }
        other => other,
    })?;

    sqlx::query(
        r#"
        UPDATE api_customers
        SET total_spent = total_spent + $1,
            last_used_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount)
    .bind(customer_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(log)
}

/// Whether a transaction hash has already been redeemed.
pub async fn payment_hash_used(pool: &DbPool, payment_hash: &str) -> Result<bool, AppError> {
    let used: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM usage_logs WHERE payment_intent_hash = $1)",
    )
    .bind(payment_hash)
    .fetch_one(pool)
    .await?;

    Ok(used)
}

/// Spend of a customer on a plan for the current UTC day and month.
pub async fn usage_totals(
    pool: &DbPool,
    customer_id: Uuid,
    plan_id: Uuid,
) -> Result<UsageTotals, AppError> {
    let (daily_total, monthly_total): (Decimal, Decimal) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(amount) FILTER (
                WHERE timestamp >= date_trunc('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'
            ), 0) AS daily_total,
            COALESCE(SUM(amount), 0) AS monthly_total
        FROM usage_logs
        WHERE customer_id = $1
          AND plan_id = $2
          AND timestamp >= date_trunc('month', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'
        "#,
    )
    .bind(customer_id)
    .bind(plan_id)
    .fetch_one(pool)
    .await?;

    Ok(UsageTotals {
        daily_total: daily_total.normalize(),
        monthly_total: monthly_total.normalize(),
    })
}

/// Spend totals looked up by wallet; zero for wallets that never paid.
pub async fn usage_totals_for_wallet(
    pool: &DbPool,
    wallet_address: &str,
    plan_id: Uuid,
) -> Result<UsageTotals, AppError> {
    match find_customer(pool, wallet_address).await? {
        Some(customer) => usage_totals(pool, customer.id, plan_id).await,
        None => Ok(UsageTotals::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    use crate::{
        models::subscription_plan::SubscriptionPlan,
        test_support::{CUSTOMER_WALLET, DEVELOPER_WALLET, TX_HASH, seed_developer, seed_plan},
    };

    async fn customer_and_plan(pool: &PgPool) -> (ApiCustomer, SubscriptionPlan) {
        let (developer, _) = seed_developer(pool, DEVELOPER_WALLET).await;
        let plan = seed_plan(pool, &developer, dec!(0.25), None).await;
        let customer = get_or_create_customer(pool, CUSTOMER_WALLET).await.unwrap();
        (customer, plan)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn one_customer_per_wallet(pool: PgPool) {
        let first = get_or_create_customer(&pool, CUSTOMER_WALLET).await.unwrap();
        let second = get_or_create_customer(&pool, CUSTOMER_WALLET).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.total_spent, Decimal::ZERO);
        assert!(first.last_used_at.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn logging_usage_bumps_total_spent(pool: PgPool) {
        let (customer, plan) = customer_and_plan(&pool).await;

        let log = log_usage(&pool, customer.id, plan.id, dec!(0.25), Some(TX_HASH), Some("api-call"))
            .await
            .unwrap();
        assert_eq!(log.payment_intent_hash.as_deref(), Some(TX_HASH));
        assert!(payment_hash_used(&pool, TX_HASH).await.unwrap());

        // Unpaid entries carry no hash and never collide
        log_usage(&pool, customer.id, plan.id, dec!(0.25), None, None)
            .await
            .unwrap();
        log_usage(&pool, customer.id, plan.id, dec!(0.25), None, None)
            .await
            .unwrap();

        let customer = find_customer(&pool, CUSTOMER_WALLET).await.unwrap().unwrap();
        assert_eq!(customer.total_spent, dec!(0.75));
        assert!(customer.last_used_at.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn a_redeemed_hash_conflicts_and_rolls_back(pool: PgPool) {
        let (customer, plan) = customer_and_plan(&pool).await;

        log_usage(&pool, customer.id, plan.id, dec!(0.25), Some(TX_HASH), None)
            .await
            .unwrap();

        match log_usage(&pool, customer.id, plan.id, dec!(0.25), Some(TX_HASH), None).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, "Payment has already been redeemed"),
            other => panic!("unexpected result: {other:?}"),
        }

        let customer = find_customer(&pool, CUSTOMER_WALLET).await.unwrap().unwrap();
        assert_eq!(customer.total_spent, dec!(0.25));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn totals_only_count_the_current_period(pool: PgPool) {
        let (customer, plan) = customer_and_plan(&pool).await;

        log_usage(&pool, customer.id, plan.id, dec!(0.25), None, None)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO usage_logs (customer_id, plan_id, amount, timestamp) VALUES ($1, $2, $3, NOW() - INTERVAL '40 days')",
        )
        .bind(customer.id)
        .bind(plan.id)
        .bind(dec!(5))
        .execute(&pool)
        .await
        .unwrap();

        let totals = usage_totals(&pool, customer.id, plan.id).await.unwrap();
        assert_eq!(totals.daily_total, dec!(0.25));
        assert_eq!(totals.monthly_total, dec!(0.25));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_wallets_have_zero_totals(pool: PgPool) {
        let (_, plan) = customer_and_plan(&pool).await;

        let totals = usage_totals_for_wallet(&pool, "0x2222222222222222222222222222222222222222", plan.id)
            .await
            .unwrap();

        assert_eq!(totals, UsageTotals::ZERO);
    }
}
