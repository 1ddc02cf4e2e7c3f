use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::error::AppError;
use crate::state::{AppState, SharedState};
use crate::submission::{is_email, is_username, Submission};
use crate::verification::{self, VerificationType};

fn parse(payload: BTreeMap<String, String>) -> Submission<String> {
    let mut submission = Submission::new(payload);

    let Some(target) = submission.require("usernameOrEmail", "Username or email is required") else {
        return submission;
    };

    if !is_username(&target) && !is_email(&target) {
        submission.add_error("usernameOrEmail", "Enter a valid username or email");
        return submission;
    }

    submission.accept(target)
}

/// Start a password reset. Responds with the same redirect whether or not the
/// account exists. Lookup, issue and mail run in the background so the
/// response time does not depend on the account either.
pub async fn forgot_password(
    State(state): State<SharedState>,
    Form(payload): Form<BTreeMap<String, String>>,
) -> Response {
    let submission = parse(payload);
    let Some(target) = submission.value.clone() else {
        return submission.reply();
    };

    let kind = VerificationType::ResetPassword;
    let location = verification::verify_path(kind, &target, None);

    tokio::spawn(async move {
        if let Err(e) = send_reset_code(&state, kind, &target).await {
            tracing::error!("Failed to start password reset: {e}");
        }
    });

    Redirect::to(&location).into_response()
}

async fn send_reset_code(
    state: &AppState,
    kind: VerificationType,
    target: &str,
) -> Result<(), AppError> {
    let Some(account) = state.accounts.find_by_email_or_username(target).await? else {
        tracing::info!("Password reset requested for unknown account");
        return Ok(());
    };

    let issued = verification::issue(state.verifications.as_ref(), kind, target).await?;
    let verify_url = format!(
        "{}{}",
        state.config.base_url,
        verification::verify_path(kind, target, Some(&issued.code))
    );

    match &state.system_mailer {
        Some(mailer) => mailer
            .send_password_reset(&account.email, &issued.code, &verify_url)
            .await
            .map_err(AppError::Internal)?,
        None => {
            tracing::warn!(
                expires_at = %issued.expires_at,
                "System SMTP not configured. Password reset code: {}",
                issued.code
            );
        }
    }

    Ok(())
}
