//! Configuration loading
//!
//! Settings come from an optional YAML file, then environment variables
//! override individual keys. Every section has defaults, so an empty file (or
//! no file at all) gives a working development setup on the in-memory
//! backend.

use crate::core::code::SequenceStrategy;
use crate::media::CloudinaryConfig;
use crate::media::cloudinary::DEFAULT_FOLDER;
use anyhow::{Context, Result, bail};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub codes: CodesConfig,
    pub mail: MailConfig,
    pub media: MediaConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("unknown environment '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Origin allowed by CORS
    pub frontend_url: String,
    /// Expose `/api/debug/db`
    pub debug_routes: bool,
    /// Ping the storage backend before each request, answering 503 when down
    pub check_storage_per_request: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: Environment::Development,
            frontend_url: "http://localhost:3000".to_string(),
            debug_routes: false,
            check_storage_per_request: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MongoDB connection string; the in-memory backend is used when unset
    pub uri: Option<String>,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            name: "yooreedevent".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 7 * 24 * 3600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesConfig {
    pub strategy: SequenceStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// HTTP relay receiving `{from, to, subject, html}`; emails are only
    /// logged when unset
    pub relay_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    /// Receives a copy of every contact message
    pub admin_email: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            api_key: None,
            from: "noreply@yooreed-event.com".to_string(),
            admin_email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: DEFAULT_FOLDER.to_string(),
        }
    }
}

/// Per-client request quotas
///
/// Quotas refill evenly over the window, so a client that used its whole
/// burst gets one request back every `window_secs / max` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_secs: u64,
    /// Requests per window on every `/api` route
    pub api_max: u32,
    /// Attempts per window on `POST /api/auth/login`
    pub login_max: u32,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 || self.api_max == 0 || self.login_max == 0 {
            bail!("rate_limit window_secs, api_max and login_max must be positive");
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            api_max: 100,
            login_max: 5,
        }
    }
}

impl AppConfig {
    /// Load from an optional YAML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.rate_limit.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Override keys from `lookup` (the process environment in production)
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = v.parse().with_context(|| format!("invalid PORT '{}'", v))?;
        }
        if let Some(v) = get("APP_ENV") {
            self.server.environment = Environment::parse(&v)?;
        }
        if let Some(v) = get("FRONTEND_URL") {
            self.server.frontend_url = v;
        }
        if let Some(v) = get("MONGODB_URI") {
            self.database.uri = Some(v);
        }
        if let Some(v) = get("MONGODB_DATABASE") {
            self.database.name = v;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = Some(v);
        }
        if let Some(v) = get("JWT_EXPIRES_IN_SECS") {
            self.auth.token_ttl_secs = v
                .parse()
                .with_context(|| format!("invalid JWT_EXPIRES_IN_SECS '{}'", v))?;
        }
        if let Some(v) = get("ADMIN_EMAIL") {
            self.mail.admin_email = Some(v);
        }
        if let Some(v) = get("MAIL_RELAY_URL") {
            self.mail.relay_url = Some(v);
        }
        if let Some(v) = get("MAIL_API_KEY") {
            self.mail.api_key = Some(v);
        }
        if let Some(v) = get("MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = get("CLOUDINARY_CLOUD_NAME") {
            self.media.cloud_name = Some(v);
        }
        if let Some(v) = get("CLOUDINARY_API_KEY") {
            self.media.api_key = Some(v);
        }
        if let Some(v) = get("CLOUDINARY_API_SECRET") {
            self.media.api_secret = Some(v);
        }
        if let Some(v) = get("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v
                .parse()
                .with_context(|| format!("invalid RATE_LIMIT_ENABLED '{}'", v))?;
        }
        if let Some(v) = get("RATE_LIMIT_MAX") {
            self.rate_limit.api_max = v
                .parse()
                .with_context(|| format!("invalid RATE_LIMIT_MAX '{}'", v))?;
        }
        if let Some(v) = get("LOGIN_RATE_LIMIT_MAX") {
            self.rate_limit.login_max = v
                .parse()
                .with_context(|| format!("invalid LOGIN_RATE_LIMIT_MAX '{}'", v))?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    /// Rate limiting applies outside the test environment, when enabled
    pub fn rate_limit_active(&self) -> bool {
        self.rate_limit.enabled && self.server.environment != Environment::Test
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Key used to sign bearer tokens
    ///
    /// Production refuses to start without a configured secret. Elsewhere a
    /// random secret is generated, so tokens do not survive a restart.
    pub fn jwt_secret(&self) -> Result<Vec<u8>> {
        if let Some(secret) = self.auth.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            return Ok(secret.as_bytes().to_vec());
        }
        if self.is_production() {
            bail!("JWT_SECRET must be set in production");
        }

        tracing::warn!("JWT_SECRET is not set, using a random per-process secret");
        let mut secret = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Ok(secret)
    }

    /// Cloudinary settings, when all three credentials are present
    pub fn cloudinary(&self) -> Option<CloudinaryConfig> {
        Some(CloudinaryConfig {
            cloud_name: self.media.cloud_name.clone()?,
            api_key: self.media.api_key.clone()?,
            api_secret: self.media.api_secret.clone()?,
            folder: self.media.folder.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.codes.strategy, SequenceStrategy::Counter);
        assert_eq!(config.auth.token_ttl_secs, 604_800);
        assert!(config.database.uri.is_none());
        assert!(config.cloudinary().is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
server:
  port: 8080
  debug_routes: true
codes:
  strategy: count
media:
  cloud_name: demo
  api_key: key
  api_secret: secret
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug_routes);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.codes.strategy, SequenceStrategy::Count);

        let cloudinary = config.cloudinary().unwrap();
        assert_eq!(cloudinary.cloud_name, "demo");
        assert_eq!(cloudinary.folder, DEFAULT_FOLDER);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::from_yaml_str("server:\n  port: 8080\n").unwrap();
        config
            .apply_overrides(env(&[
                ("PORT", "9000"),
                ("APP_ENV", "production"),
                ("MONGODB_URI", "mongodb://localhost:27017"),
                ("JWT_SECRET", "s3cret"),
                ("ADMIN_EMAIL", ""),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.database.uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.jwt_secret().unwrap(), b"s3cret".to_vec());
        assert!(config.mail.admin_email.is_none());
    }

    #[test]
    fn test_rate_limit_settings() {
        let mut config = AppConfig::default();
        assert!(config.rate_limit_active());
        assert_eq!(config.rate_limit.api_max, 100);
        assert_eq!(config.rate_limit.login_max, 5);
        assert_eq!(config.rate_limit.window_secs, 900);

        config
            .apply_overrides(env(&[("LOGIN_RATE_LIMIT_MAX", "10"), ("APP_ENV", "test")]))
            .unwrap();
        assert_eq!(config.rate_limit.login_max, 10);
        assert!(!config.rate_limit_active());

        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[("RATE_LIMIT_ENABLED", "false")]))
            .unwrap();
        assert!(!config.rate_limit_active());
        assert!(config.apply_overrides(env(&[("RATE_LIMIT_MAX", "lots")])).is_err());

        config.rate_limit.login_max = 0;
        assert!(config.rate_limit.validate().is_err());
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = AppConfig::default();
        assert!(config.apply_overrides(env(&[("PORT", "abc")])).is_err());
        assert!(config.apply_overrides(env(&[("APP_ENV", "staging")])).is_err());
    }

    #[test]
    fn test_jwt_secret_policy() {
        let mut config = AppConfig::default();
        let a = config.jwt_secret().unwrap();
        let b = config.jwt_secret().unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);

        config.server.environment = Environment::Production;
        assert!(config.jwt_secret().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("yooreed.yaml");
        std::fs::write(&path, "database:\n  name: boutique\nmail:\n  admin_email: admin@example.com\n")
            .unwrap();

        let config = AppConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.database.name, "boutique");
        assert_eq!(config.mail.admin_email.as_deref(), Some("admin@example.com"));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_unreadable_or_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(AppConfig::from_yaml_file(&dir.path().join("missing.yaml")).is_err());

        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "server:\n  port: not-a-port\n").unwrap();
        let err = AppConfig::from_yaml_file(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }
}
