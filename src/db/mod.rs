//! Storage seams for accounts and verification codes.
//!
//! Handlers only see the traits; `PgAccounts`/`PgVerifications` back them in
//! production and the [`memory`] stores back them in tests and local runs.

pub mod accounts;
pub mod memory;
pub mod verifications;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Account, Verification};

pub use accounts::PgAccounts;
pub use verifications::PgVerifications;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// First account whose email or username equals `target`.
    async fn find_by_email_or_username(&self, target: &str)
        -> Result<Option<Account>, sqlx::Error>;
}

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Insert a verification, replacing any existing one for the same `(kind, target)`.
    async fn upsert(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Verification, sqlx::Error>;

    /// Atomically remove and return the verification for `(kind, target)` if
    /// its hash equals `code_hash` and it is unexpired at `now`. Of two
    /// concurrent calls with the right code, only one gets `Some`. A
    /// non-matching call leaves the record in place.
    async fn take_matching(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Verification>, sqlx::Error>;

    /// Delete every verification that expired at or before `now`. Returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}
