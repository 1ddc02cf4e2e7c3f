use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::VerificationRepository;
use crate::models::Verification;

#[derive(Clone)]
pub struct PgVerifications {
    pool: PgPool,
}

impl PgVerifications {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerifications {
    async fn upsert(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Verification, sqlx::Error> {
        sqlx::query_as::<_, Verification>(
            "INSERT INTO verifications (type, target, code_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (type, target)
             DO UPDATE SET code_hash = EXCLUDED.code_hash,
                           expires_at = EXCLUDED.expires_at,
                           created_at = now()
             RETURNING *",
        )
        .bind(kind)
        .bind(target)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn take_matching(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Verification>, sqlx::Error> {
        sqlx::query_as::<_, Verification>(
            "DELETE FROM verifications
             WHERE type = $1 AND target = $2 AND code_hash = $3 AND expires_at > $4
             RETURNING *",
        )
        .bind(kind)
        .bind(target)
        .bind(code_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM verifications WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
