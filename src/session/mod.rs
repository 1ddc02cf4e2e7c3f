//! Short-lived signed sessions carried in a cookie.

mod cookie;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use self::cookie::CookieSessionStorage;

/// Session key naming the account that has proven it may reset its password.
pub const RESET_PASSWORD_USERNAME_KEY: &str = "resetPasswordUsername";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    data: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load the session from a request `Cookie` header.
    ///
    /// A missing, malformed or tampered cookie yields an empty session.
    async fn get_session(&self, cookie_header: Option<&str>) -> Session;

    /// Serialize and sign `session`, returning a `Set-Cookie` header value.
    async fn commit_session(&self, session: &Session) -> Result<String, String>;
}
