#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

use resetflow::config::Config;
use resetflow::crypto;
use resetflow::db::memory::{MemoryAccounts, MemoryVerifications};
use resetflow::session::{CookieSessionStorage, Session, SessionStorage};
use resetflow::state::{AppState, SharedState};
use resetflow::verification::{self, VerificationType};

pub const SESSION_SECRET: &str = "test-session-secret-that-is-long-enough";

/// A running test server backed by in-memory stores.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub accounts: Arc<MemoryAccounts>,
    pub verifications: Arc<MemoryVerifications>,
    pub sessions: Arc<CookieSessionStorage>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Issue a reset-password code for `target` without going through the mailer.
    pub async fn issue_code(&self, target: &str) -> String {
        verification::issue(
            self.verifications.as_ref(),
            VerificationType::ResetPassword,
            target,
        )
        .await
        .expect("issue code failed")
        .code
    }

    /// Wait for background work to leave `count` stored codes.
    pub async fn wait_for_codes(&self, count: usize) {
        for _ in 0..100 {
            if self.verifications.len() == count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!(
            "expected {count} stored codes, found {}",
            self.verifications.len()
        );
    }

    pub async fn forgot_password(&self, username_or_email: &str) -> Response {
        self.client
            .post(self.url("/forgot-password"))
            .form(&[("usernameOrEmail", username_or_email)])
            .send()
            .await
            .expect("forgot-password request failed")
    }

    /// POST /verify with an optional request `Cookie` header.
    pub async fn verify(
        &self,
        target: &str,
        code: &str,
        cookie: Option<&str>,
    ) -> Response {
        let mut req = self
            .client
            .post(self.url("/verify"))
            .form(&[("type", "reset-password"), ("target", target), ("code", code)]);
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.expect("verify request failed")
    }

    /// Parse the session carried by a response's `set-cookie` header.
    pub async fn session_from(&self, resp: &Response) -> Session {
        let header = set_cookie(resp).expect("response has no set-cookie header");
        self.sessions.get_session(Some(&request_cookie(&header))).await
    }

    /// Request `Cookie` header value carrying `session`.
    pub async fn cookie_for(&self, session: &Session) -> String {
        let header = self
            .sessions
            .commit_session(session)
            .await
            .expect("commit session failed");
        request_cookie(&header)
    }
}

pub fn set_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `name=value` part of a `Set-Cookie` header, usable as a request `Cookie`.
pub fn request_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub async fn json_body(resp: Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        session_secret: SESSION_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        secure_cookies: false,
        log_level: "warn".to_string(),
        smtp: None,
    }
}

/// Spawn the app on a random port with empty in-memory stores.
pub async fn spawn_app() -> TestApp {
    let config = test_config();

    let accounts = Arc::new(MemoryAccounts::new());
    let verifications = Arc::new(MemoryVerifications::new());
    let sessions = Arc::new(CookieSessionStorage::new(
        crypto::derive_session_key(&config.session_secret),
        config.secure_cookies,
    ));

    let state: SharedState = Arc::new(AppState {
        config,
        accounts: accounts.clone(),
        verifications: verifications.clone(),
        sessions: sessions.clone(),
        system_mailer: None,
    });

    let app = resetflow::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        accounts,
        verifications,
        sessions,
    }
}
