use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound for a whole multipart body (image plus form fields).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub web_dir: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// HMAC key used to sign and verify identity tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.  This
    /// config field is the fallback for deployments that cannot inject env
    /// vars at runtime.
    ///
    /// **Minimum length:** 32 characters.
    /// **Hot-reload safe:** NO. The server reads this once at startup and
    /// stores it in `AppState.jwt_secret`.
    pub jwt_secret: Option<String>,
}

/// Hosted identity backend (Supabase-compatible REST API).
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CertificateConfig {
    #[serde(default = "default_generator_url")]
    pub generator_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Used for links (password reset target) when no Host header is known.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub certificate: CertificateConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:3000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            generator_url: default_generator_url(),
        }
    }
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" => Ok(Environment::Development),
            other => Err(ConfigError::InvalidConfig(format!(
                "unknown environment: {}",
                other
            ))),
        }
    }
}

impl SiteConfig {
    /// Base URL for absolute links.
    ///
    /// With a known host the scheme follows the environment; without one the
    /// configured public URL wins, then a per-environment default.
    pub fn base_url(&self, hostname: Option<&str>) -> String {
        if let Some(host) = hostname.filter(|h| !h.is_empty()) {
            let scheme = if self.environment.is_production() {
                "https"
            } else {
                "http"
            };
            return format!("{}://{}", scheme, host);
        }

        if let Some(url) = self.public_base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        if self.environment.is_production() {
            "https://your-domain.de".to_string()
        } else {
            "http://localhost:3000".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    3000
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_max_body_bytes() -> usize {
    12 * 1024 * 1024
}

pub fn default_generator_url() -> String {
    "http://localhost:8000/generate-certificate".to_string()
}
