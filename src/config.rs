use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub secure_cookies: bool,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let session_secret = env_required("SESSION_SECRET")?;

        if session_secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 characters".to_string());
        }

        let host: IpAddr = env_or("RESETFLOW_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid RESETFLOW_HOST: {e}"))?;

        let port: u16 = env_or("RESETFLOW_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid RESETFLOW_PORT: {e}"))?;

        let base_url = env_or("RESETFLOW_BASE_URL", &format!("http://{host}:{port}"));

        let secure_cookies = match env_or("RESETFLOW_SECURE_COOKIES", "true").as_str() {
            "false" | "0" => false,
            _ => true,
        };

        let log_level = env_or("RESETFLOW_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("RESETFLOW_SMTP_HOST").ok(),
            std::env::var("RESETFLOW_SMTP_PORT").ok(),
            std::env::var("RESETFLOW_SMTP_USER").ok(),
            std::env::var("RESETFLOW_SMTP_PASS").ok(),
            std::env::var("RESETFLOW_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid RESETFLOW_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            session_secret,
            host,
            port,
            base_url,
            secure_cookies,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
