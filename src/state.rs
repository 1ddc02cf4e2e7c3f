use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::crypto;
use crate::db::{AccountRepository, PgAccounts, PgVerifications, VerificationRepository};
use crate::email::SystemMailer;
use crate::session::{CookieSessionStorage, SessionStorage};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub sessions: Arc<dyn SessionStorage>,
    pub system_mailer: Option<Arc<SystemMailer>>,
}

impl AppState {
    /// Postgres-backed state with cookie sessions signed by `config.session_secret`.
    pub fn postgres(pool: PgPool, config: Config) -> SharedState {
        let sessions = CookieSessionStorage::new(
            crypto::derive_session_key(&config.session_secret),
            config.secure_cookies,
        );

        let system_mailer = config.smtp.as_ref().and_then(|smtp| {
            match SystemMailer::new(smtp) {
                Ok(mailer) => {
                    tracing::info!("System SMTP configured");
                    Some(Arc::new(mailer))
                }
                Err(e) => {
                    tracing::warn!("System SMTP not available: {e}");
                    None
                }
            }
        });

        Arc::new(AppState {
            accounts: Arc::new(PgAccounts::new(pool.clone())),
            verifications: Arc::new(PgVerifications::new(pool)),
            sessions: Arc::new(sessions),
            system_mailer,
            config,
        })
    }
}
