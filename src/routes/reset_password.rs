use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde_json::json;

use crate::db::AccountRepository;
use crate::error::AppError;
use crate::routes::verify::VerifyForm;
use crate::session::{RESET_PASSWORD_USERNAME_KEY, SessionStorage};
use crate::state::SharedState;
use crate::submission::Submission;
use crate::verification::INVALID_CODE;

pub const RESET_PASSWORD_PATH: &str = "/reset-password";
const LOGIN_PATH: &str = "/login";

const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 100;

/// Result of handling a verified reset-password code.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// Target resolved; the committed session goes out as `set-cookie`.
    Redirect { location: String, set_cookie: String },
    /// Target did not resolve. Carries the generic "Invalid code" error.
    Invalid(Submission<VerifyForm>),
}

impl IntoResponse for VerifyOutcome {
    fn into_response(self) -> Response {
        match self {
            VerifyOutcome::Redirect {
                location,
                set_cookie,
            } => (
                AppendHeaders([(SET_COOKIE, set_cookie)]),
                Redirect::to(&location),
            )
                .into_response(),
            VerifyOutcome::Invalid(submission) => submission.reply(),
        }
    }
}

/// Grant a password reset to the account behind a redeemed code.
///
/// The account is looked up by email or username. When nothing matches the
/// submission is flagged with the same message as a wrong code, so the
/// endpoint cannot be used to probe which accounts exist, and no cookie is
/// written. Otherwise the session loaded from `cookie_header` gets
/// `resetPasswordUsername` and is committed.
pub async fn handle_verification(
    accounts: &dyn AccountRepository,
    sessions: &dyn SessionStorage,
    mut submission: Submission<VerifyForm>,
    cookie_header: Option<&str>,
) -> Result<VerifyOutcome, AppError> {
    let target = submission
        .value
        .as_ref()
        .map(|form| form.target.clone())
        .filter(|target| !target.is_empty())
        .ok_or_else(|| AppError::Fatal("submission.value should be defined by now".to_string()))?;

    let Some(account) = accounts.find_by_email_or_username(&target).await? else {
        submission.add_error("code", INVALID_CODE);
        return Ok(VerifyOutcome::Invalid(submission));
    };

    let mut session = sessions.get_session(cookie_header).await;
    session.set(RESET_PASSWORD_USERNAME_KEY, account.username.clone());
    let set_cookie = sessions
        .commit_session(&session)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(account_id = %account.id, "Password reset authorized");

    Ok(VerifyOutcome::Redirect {
        location: RESET_PASSWORD_PATH.to_string(),
        set_cookie,
    })
}

async fn reset_username(state: &SharedState, headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    let session = state.sessions.get_session(cookie_header).await;
    session
        .get(RESET_PASSWORD_USERNAME_KEY)
        .filter(|username| !username.is_empty())
        .map(str::to_string)
}

pub async fn reset_password_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    match reset_username(&state, &headers).await {
        Some(username) => Json(json!({ "resetPasswordUsername": username })).into_response(),
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}

#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    pub password: String,
}

fn parse(payload: BTreeMap<String, String>) -> Submission<ResetPasswordForm> {
    let mut submission = Submission::new(payload);

    let password = submission.require("password", "Password is required");
    let confirm = submission.require("confirmPassword", "Confirm password is required");

    if let Some(password) = password.as_deref() {
        let len = password.chars().count();
        if len < PASSWORD_MIN_LEN {
            submission.add_error("password", "Password is too short");
        } else if len > PASSWORD_MAX_LEN {
            submission.add_error("password", "Password is too long");
        }
    }

    match (password, confirm) {
        (Some(password), Some(confirm)) if password != confirm => {
            submission.add_error("confirmPassword", "The passwords must match");
            submission
        }
        (Some(password), Some(_)) => submission.accept(ResetPasswordForm { password }),
        _ => submission,
    }
}

pub async fn reset_password(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(payload): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let Some(username) = reset_username(&state, &headers).await else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let submission = parse(payload);
    if submission.value.is_none() {
        return Ok(submission.reply());
    }

    tracing::warn!(%username, "Password reset submitted but password updates are not available");
    Err(AppError::Fatal(
        "This has not yet been implemented".to_string(),
    ))
}
