pub mod forgot_password;
pub mod reset_password;
pub mod verify;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn reset_routes() -> Router<SharedState> {
    Router::new()
        .route("/forgot-password", post(forgot_password::forgot_password))
        .route("/verify", get(verify::verify_page).post(verify::verify))
        .route(
            "/reset-password",
            get(reset_password::reset_password_page).post(reset_password::reset_password),
        )
}
