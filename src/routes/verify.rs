use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;

use crate::error::AppError;
use crate::routes::reset_password;
use crate::state::SharedState;
use crate::submission::Submission;
use crate::verification::{self, INVALID_CODE, VerificationType};

/// A `/verify` form that passed schema validation.
#[derive(Debug, Clone)]
pub struct VerifyForm {
    pub kind: VerificationType,
    pub target: String,
    pub code: String,
}

fn parse(payload: BTreeMap<String, String>) -> Submission<VerifyForm> {
    let mut submission = Submission::new(payload);

    let code = submission.require("code", "Code is required");
    let target = submission.require("target", "Target is required");
    let kind = match submission.require("type", "Type is required") {
        Some(raw) => {
            let kind = VerificationType::parse(&raw);
            if kind.is_none() {
                submission.add_error("type", "Invalid verification type");
            }
            kind
        }
        None => None,
    };

    match (code, kind, target) {
        (Some(code), Some(kind), Some(target)) => submission.accept(VerifyForm { kind, target, code }),
        _ => submission,
    }
}

/// Loader. With a `code` in the query this is a magic link and is verified
/// right away; otherwise the prefilled form state is returned.
pub async fn verify_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let has_code = params.get("code").is_some_and(|c| !c.trim().is_empty());
    if !has_code {
        return Ok(Json(json!({
            "status": "idle",
            "submission": { "payload": params, "error": {} },
        }))
        .into_response());
    }

    validate_request(&state, &headers, params).await
}

pub async fn verify(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(payload): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    validate_request(&state, &headers, payload).await
}

async fn validate_request(
    state: &SharedState,
    headers: &HeaderMap,
    payload: BTreeMap<String, String>,
) -> Result<Response, AppError> {
    let mut submission = parse(payload);

    let Some(form) = submission.value.clone() else {
        return Ok(submission.reply());
    };

    let redeemed = verification::redeem(
        state.verifications.as_ref(),
        form.kind,
        &form.target,
        &form.code,
    )
    .await?;

    if !redeemed {
        tracing::info!(kind = form.kind.as_str(), "Verification code rejected");
        submission.add_error("code", INVALID_CODE);
        return Ok(submission.reply());
    }

    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());

    match form.kind {
        VerificationType::ResetPassword => {
            let outcome = reset_password::handle_verification(
                state.accounts.as_ref(),
                state.sessions.as_ref(),
                submission,
                cookie_header,
            )
            .await?;
            Ok(outcome.into_response())
        }
    }
}
