use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::AccountRepository;
use crate::models::Account;

#[derive(Clone)]
pub struct PgAccounts {
    pool: PgPool,
}

impl PgAccounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccounts {
    async fn find_by_email_or_username(
        &self,
        target: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            "SELECT * FROM users WHERE email = $1 OR username = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(target)
        .fetch_optional(&self.pool)
        .await
    }
}
