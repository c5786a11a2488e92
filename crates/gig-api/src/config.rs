//! API configuration.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Shortest signing secret accepted for HS512 credentials.
pub const MIN_SECRET_LENGTH: usize = 32;

const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credential settings. Secrets are never printed by `Debug`.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for signed credentials
    pub signing_secret: String,
    /// Out-of-band operator credential
    pub bootstrap_credential: String,
    /// Lifetime of issued credentials
    pub token_ttl: Duration,
    /// Email/password pair that exchanges for the bootstrap credential
    pub admin_login: Option<AdminLogin>,
}

#[derive(Clone)]
pub struct AdminLogin {
    pub email: String,
    pub password: String,
}

impl AuthConfig {
    pub fn new(signing_secret: impl Into<String>, bootstrap_credential: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            bootstrap_credential: bootstrap_credential.into(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            admin_login: None,
        }
    }

    pub fn with_admin_login(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_login = Some(AdminLogin {
            email: email.into(),
            password: password.into(),
        });
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("bootstrap_credential", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("admin_login", &self.admin_login.as_ref().map(|a| &a.email))
            .finish()
    }
}

/// Optional hardening of the job workflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
    /// Reject writes whose record changed since it was read
    pub strict_writes: bool,
    /// Reject transitions that leave the lifecycle diagram
    pub enforce_lifecycle: bool,
}

/// Text-generation oracle settings.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    pub metrics_enabled: bool,
    pub auth: AuthConfig,
    pub workflow: WorkflowConfig,
    pub gemini: GeminiConfig,
}

impl ApiConfig {
    /// Server defaults around the given credential settings.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
            environment: "development".to_string(),
            metrics_enabled: true,
            auth,
            workflow: WorkflowConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let signing_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if signing_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LENGTH),
            });
        }
        let bootstrap_credential =
            var("ADMIN_BOOTSTRAP_TOKEN").ok_or(ConfigError::Missing("ADMIN_BOOTSTRAP_TOKEN"))?;

        let mut auth = AuthConfig::new(signing_secret, bootstrap_credential);
        auth.token_ttl = Duration::from_secs(parse_var(&var, "JWT_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?);
        if let (Some(email), Some(password)) = (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            auth = auth.with_admin_login(email, password);
        }

        let defaults = Self::new(auth);

        Ok(Self {
            host: var("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&var, "API_PORT", defaults.port)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_var(&var, "RATE_LIMIT_RPS", defaults.rate_limit_rps)?,
            request_timeout: Duration::from_secs(parse_var(&var, "REQUEST_TIMEOUT", 30)?),
            max_body_size: parse_var(&var, "MAX_BODY_SIZE", defaults.max_body_size)?,
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: var("METRICS_ENABLED").map(|v| flag(&v)).unwrap_or(true),
            auth: defaults.auth,
            workflow: WorkflowConfig {
                strict_writes: var("WORKFLOW_STRICT_WRITES").map(|v| flag(&v)).unwrap_or(false),
                enforce_lifecycle: var("WORKFLOW_ENFORCE_LIFECYCLE")
                    .map(|v| flag(&v))
                    .unwrap_or(false),
            },
            gemini: GeminiConfig {
                api_key: var("GEMINI_API_KEY"),
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: var("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout: defaults.gemini.timeout,
            },
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn parse_var<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_secrets() {
        let err = ApiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = ApiConfig::from_lookup(lookup(&[("JWT_SECRET", SECRET)])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ADMIN_BOOTSTRAP_TOKEN"));
    }

    #[test]
    fn test_rejects_short_secret() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "short"),
            ("ADMIN_BOOTSTRAP_TOKEN", "boot"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_SECRET", .. }));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ADMIN_BOOTSTRAP_TOKEN", "boot"),
            ("API_PORT", "9000"),
            ("WORKFLOW_STRICT_WRITES", "true"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit_rps, 10);
        assert_eq!(config.auth.token_ttl, Duration::from_secs(86_400));
        assert!(config.workflow.strict_writes);
        assert!(!config.workflow.enforce_lifecycle);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert!(config.auth.admin_login.is_none());
    }

    #[test]
    fn test_invalid_number() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("ADMIN_BOOTSTRAP_TOKEN", "boot"),
            ("API_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "API_PORT", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthConfig::new(SECRET, "boot-credential");
        let printed = format!("{:?}", auth);
        assert!(!printed.contains(SECRET));
        assert!(!printed.contains("boot-credential"));
    }
}
