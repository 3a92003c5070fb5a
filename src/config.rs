use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::rate_limit::RateLimitConfig;

const MIN_SECRET_LEN: usize = 32;

/// Runtime settings, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub auth_timeout: Duration,
    /// Member workspaces untouched this long are dropped.
    pub workspace_idle: Duration,
    pub frontend_url: Option<String>,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub bootstrap_admins: HashSet<String>,
    pub enable_hsts: bool,
    pub secure_cookies: bool,
    pub rate_limit_enabled: bool,
    pub rate_limits: RateLimitConfig,
}

impl AppConfig {
    /// Defaults around an explicit secret. Used by tests and as the base of
    /// [`AppConfig::from_env`].
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            jwt_secret: jwt_secret.into(),
            session_ttl_hours: 24,
            auth_timeout: Duration::from_secs(15),
            workspace_idle: Duration::from_secs(2 * 60 * 60),
            frontend_url: None,
            data_dir: PathBuf::from("data"),
            database_url: None,
            bootstrap_admins: HashSet::new(),
            enable_hsts: false,
            secure_cookies: false,
            rate_limit_enabled: true,
            rate_limits: RateLimitConfig::default(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.len() < MIN_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }
        let mut cfg = Self::new(secret);
        if let Some(host) = var("SERVER_HOST") {
            cfg.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            cfg.port = port.parse().context("SERVER_PORT must be a port number")?;
        }
        if let Some(ttl) = var("SESSION_TTL_HOURS") {
            cfg.session_ttl_hours = ttl.parse().context("SESSION_TTL_HOURS must be an integer")?;
        }
        if let Some(secs) = var("AUTH_TIMEOUT_SECS") {
            cfg.auth_timeout = Duration::from_secs(secs.parse().context("AUTH_TIMEOUT_SECS must be an integer")?);
        }
        if let Some(mins) = var("WORKSPACE_IDLE_MINS") {
            cfg.workspace_idle =
                Duration::from_secs(60 * mins.parse::<u64>().context("WORKSPACE_IDLE_MINS must be an integer")?);
        }
        if let Some(dir) = var("FILMCOLLAB_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        cfg.frontend_url = var("FRONTEND_URL");
        cfg.database_url = var("DATABASE_URL");
        cfg.bootstrap_admins = var("BOOTSTRAP_ADMIN_IDS")
            .map(|ids| ids.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();
        cfg.enable_hsts = flag("ENABLE_HSTS", false);
        cfg.secure_cookies = flag("SECURE_COOKIES", false);
        cfg.rate_limit_enabled = flag("RL_ENABLED", true);
        cfg.rate_limits = RateLimitConfig::from_env();
        Ok(cfg)
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn short_secret_is_rejected() {
        std::env::set_var("JWT_SECRET", "too-short");
        assert!(AppConfig::from_env().is_err());
        std::env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        std::env::set_var("JWT_SECRET", "0123456789abcdef0123456789abcdef");
        std::env::set_var("SERVER_PORT", "9090");
        std::env::set_var("BOOTSTRAP_ADMIN_IDS", "ava, ,root");
        std::env::set_var("WORKSPACE_IDLE_MINS", "5");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.workspace_idle, Duration::from_secs(300));
        assert!(cfg.bootstrap_admins.contains("ava"));
        assert!(cfg.bootstrap_admins.contains("root"));
        assert_eq!(cfg.bootstrap_admins.len(), 2);
        for k in ["JWT_SECRET", "SERVER_PORT", "BOOTSTRAP_ADMIN_IDS", "WORKSPACE_IDLE_MINS"] {
            std::env::remove_var(k);
        }
    }
}
