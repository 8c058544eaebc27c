use std::fs;
use tracing::{debug, error, info, warn};

use crate::types::server_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let mut config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

/// Environment variables win over the file. `JWT_SECRET` is resolved lazily
/// by [`AuthConfig::resolved_jwt_secret`](crate::types::AuthConfig::resolved_jwt_secret).
fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Some(env) = non_empty_var("APP_ENV") {
        config.site.environment = env.parse()?;
        debug!("APP_ENV override: {:?}", config.site.environment);
    }

    if let Some(url) = non_empty_var("PUBLIC_BASE_URL") {
        config.site.public_base_url = Some(url);
    }

    if let Some(url) = non_empty_var("BACKEND_URL") {
        config.backend.url = url;
    }

    if let Some(key) = non_empty_var("BACKEND_ANON_KEY") {
        config.backend.anon_key = key;
    }

    Ok(())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.paths.web_dir.is_empty() {
        return Err(ConfigError::InvalidConfig("web_dir cannot be empty".into()));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    if let Err(e) = url::Url::parse(&config.backend.url) {
        return Err(ConfigError::InvalidConfig(format!(
            "backend.url is not a valid URL: {}",
            e
        )));
    }

    if config.backend.anon_key.is_empty() {
        warn!("backend.anon_key is empty; identity backend calls will be rejected");
    }

    if let Err(e) = url::Url::parse(&config.certificate.generator_url) {
        return Err(ConfigError::InvalidConfig(format!(
            "certificate.generator_url is not a valid URL: {}",
            e
        )));
    }

    // Validated here so a bad config is rejected immediately, including on
    // SIGHUP hot-reloads, rather than failing at the first sign-in.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < 32 => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be at least 32 characters long".into(),
            ));
        }
        _ => {}
    }

    Ok(())
}
