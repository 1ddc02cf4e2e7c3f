use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::crypto;
use crate::db::{AccountRepository, VerificationRepository};
use crate::models::{Account, Verification};

/// Account store held in process memory.
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: DashMap<Uuid, Account>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, email: &str, username: &str, name: Option<&str>) -> Account {
        let account = Account {
            id: Uuid::now_v7(),
            email: email.to_string(),
            username: username.to_string(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
        };
        self.accounts.insert(account.id, account.clone());
        account
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_by_email_or_username(
        &self,
        target: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        Ok(self
            .accounts
            .iter()
            .filter(|entry| entry.email == target || entry.username == target)
            .min_by_key(|entry| (entry.created_at, entry.id))
            .map(|entry| entry.value().clone()))
    }
}

/// Verification store held in process memory, keyed by `(kind, target)`.
#[derive(Default)]
pub struct MemoryVerifications {
    entries: DashMap<(String, String), Verification>,
}

impl MemoryVerifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VerificationRepository for MemoryVerifications {
    async fn upsert(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Verification, sqlx::Error> {
        let verification = Verification {
            id: Uuid::now_v7(),
            kind: kind.to_string(),
            target: target.to_string(),
            code_hash: code_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        self.entries.insert(
            (kind.to_string(), target.to_string()),
            verification.clone(),
        );
        Ok(verification)
    }

    async fn take_matching(
        &self,
        kind: &str,
        target: &str,
        code_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Verification>, sqlx::Error> {
        Ok(self
            .entries
            .remove_if(&(kind.to_string(), target.to_string()), |_, v| {
                !v.is_expired(now) && crypto::hashes_match(&v.code_hash, code_hash)
            })
            .map(|(_, v)| v))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut removed = 0;
        self.entries.retain(|_, v| {
            let keep = !v.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
