use async_trait::async_trait;
use cookie::time::Duration;
use cookie::{Cookie, CookieJar, Key, SameSite};

use super::{Session, SessionStorage};

const DEFAULT_COOKIE_NAME: &str = "verification";
const DEFAULT_MAX_AGE_SECS: i64 = 10 * 60;

/// Session storage that keeps the whole session in an HMAC-signed cookie.
///
/// The session is JSON, hex encoded so the cookie value stays within the
/// cookie octet grammar, then signed with the `cookie` crate's signed jar.
#[derive(Clone)]
pub struct CookieSessionStorage {
    key: Key,
    name: String,
    max_age: Duration,
    secure: bool,
}

impl CookieSessionStorage {
    pub fn new(key: Key, secure: bool) -> Self {
        Self {
            key,
            name: DEFAULT_COOKIE_NAME.to_string(),
            max_age: Duration::seconds(DEFAULT_MAX_AGE_SECS),
            secure,
        }
    }

    fn decode(value: &str) -> Result<Session, String> {
        let bytes = hex::decode(value).map_err(|e| format!("Invalid session encoding: {e}"))?;
        serde_json::from_slice(&bytes).map_err(|e| format!("Invalid session payload: {e}"))
    }

    fn build(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age)
            .build()
    }
}

#[async_trait]
impl SessionStorage for CookieSessionStorage {
    async fn get_session(&self, cookie_header: Option<&str>) -> Session {
        let Some(header) = cookie_header else {
            return Session::new();
        };

        let mut jar = CookieJar::new();
        for cookie in Cookie::split_parse(header).flatten() {
            if cookie.name() == self.name {
                jar.add_original(cookie.into_owned());
            }
        }

        let Some(verified) = jar.signed(&self.key).get(&self.name) else {
            return Session::new();
        };

        Self::decode(verified.value()).unwrap_or_else(|e| {
            tracing::debug!("Discarding unreadable session cookie: {e}");
            Session::new()
        })
    }

    async fn commit_session(&self, session: &Session) -> Result<String, String> {
        let payload =
            serde_json::to_vec(session).map_err(|e| format!("Failed to serialize session: {e}"))?;

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(self.name.clone(), hex::encode(payload)));

        let signed = jar
            .get(&self.name)
            .map(|c| c.value().to_string())
            .ok_or_else(|| "Failed to sign session cookie".to_string())?;

        Ok(self.build(signed).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> CookieSessionStorage {
        CookieSessionStorage::new(Key::generate(), true)
    }

    fn request_header(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn missing_cookie_gives_empty_session() {
        let storage = storage();
        assert!(storage.get_session(None).await.is_empty());
        assert!(storage.get_session(Some("other=1")).await.is_empty());
    }

    #[tokio::test]
    async fn committed_session_loads_back() {
        let storage = storage();
        let mut session = Session::new();
        session.set("resetPasswordUsername", "alice");

        let set_cookie = storage.commit_session(&session).await.unwrap();
        assert!(set_cookie.starts_with("verification="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=600"));

        let header = format!("theme=dark; {}", request_header(&set_cookie));
        let loaded = storage.get_session(Some(&header)).await;
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn tampered_cookie_is_rejected() {
        let storage = storage();
        let mut session = Session::new();
        session.set("resetPasswordUsername", "alice");
        let set_cookie = storage.commit_session(&session).await.unwrap();

        let mut forged = Session::new();
        forged.set("resetPasswordUsername", "mallory");
        let forged_payload = hex::encode(serde_json::to_vec(&forged).unwrap());

        // Keep the signature, swap the payload.
        let header = request_header(&set_cookie);
        let value = header.trim_start_matches("verification=");
        let signature = &value[..44];
        let tampered = format!("verification={signature}{forged_payload}");

        assert!(storage.get_session(Some(&tampered)).await.is_empty());
    }

    #[tokio::test]
    async fn cookie_signed_with_other_key_is_rejected() {
        let ours = storage();
        let theirs = storage();
        let mut session = Session::new();
        session.set("resetPasswordUsername", "alice");

        let set_cookie = theirs.commit_session(&session).await.unwrap();
        let loaded = ours.get_session(Some(&request_header(&set_cookie))).await;
        assert!(loaded.is_empty());
    }
}
