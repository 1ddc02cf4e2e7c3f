//! One-time codes sent out of band to prove control of an email address.

use chrono::{DateTime, Duration, Utc};

use crate::crypto;
use crate::db::VerificationRepository;

/// How long an issued code stays redeemable.
pub const CODE_TTL_MINUTES: i64 = 10;

/// The only message a failed verification ever shows, whatever the cause.
pub const INVALID_CODE: &str = "Invalid code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationType {
    ResetPassword,
}

impl VerificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationType::ResetPassword => "reset-password",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reset-password" => Some(VerificationType::ResetPassword),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a fresh code for `(kind, target)`, replacing any outstanding one.
/// Expired codes for every target are swept first.
pub async fn issue(
    repo: &dyn VerificationRepository,
    kind: VerificationType,
    target: &str,
) -> Result<IssuedCode, sqlx::Error> {
    let now = Utc::now();
    let swept = repo.delete_expired(now).await?;
    if swept > 0 {
        tracing::debug!(swept, "Expired verification codes removed");
    }

    let code = crypto::generate_code();
    let expires_at = now + Duration::minutes(CODE_TTL_MINUTES);

    repo.upsert(kind.as_str(), target, &crypto::hash_code(&code), expires_at)
        .await?;

    tracing::info!(kind = kind.as_str(), "Verification code issued");
    Ok(IssuedCode { code, expires_at })
}

/// Check `code` for `(kind, target)`. A matching, unexpired code is consumed
/// in the same store call, so it redeems at most once even under concurrency.
pub async fn redeem(
    repo: &dyn VerificationRepository,
    kind: VerificationType,
    target: &str,
    code: &str,
) -> Result<bool, sqlx::Error> {
    let taken = repo
        .take_matching(kind.as_str(), target, &crypto::hash_code(code), Utc::now())
        .await?;
    Ok(taken.is_some())
}

/// `/verify` path with the query prefilled. Including `code` makes it a magic link.
pub fn verify_path(kind: VerificationType, target: &str, code: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("type", kind.as_str());
    query.append_pair("target", target);
    if let Some(code) = code {
        query.append_pair("code", code);
    }
    format!("/verify?{}", query.finish())
}
