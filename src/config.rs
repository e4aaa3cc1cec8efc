//! Configuration loader — merges defaults, config.toml, and env vars.

use std::path::Path;

use common::{AppConfig, Error};

fn parse_positive_usize(raw: &str, env_name: &str) -> Result<usize, Error> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::Config(format!("{} must be an integer > 0", env_name)))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{} must be an integer > 0", env_name)));
    }
    Ok(parsed)
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.endpoints.summarized_url.trim().is_empty() {
        issues.push("endpoints.summarized_url must not be empty".into());
    }
    if config.endpoints.unsummarized_url.trim().is_empty() {
        issues.push("endpoints.unsummarized_url must not be empty".into());
    }
    if config.http.timeout_secs == 0 {
        issues.push("http.timeout_secs must be > 0".into());
    }
    if config.paginate.default_limit == 0 {
        issues.push("paginate.default_limit must be > 0".into());
    }
    if config.paginate.max_limit < config.paginate.default_limit {
        issues.push("paginate.max_limit must be >= paginate.default_limit".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load configuration from defaults, an optional config.toml, and
/// environment variables (highest priority).
pub fn load_config() -> Result<AppConfig, Error> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let mut config = AppConfig::default();

    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    if let Ok(url) = std::env::var("NDFD_SUMMARIZED_URL") {
        config.endpoints.summarized_url = url;
    }
    if let Ok(url) = std::env::var("NDFD_UNSUMMARIZED_URL") {
        config.endpoints.unsummarized_url = url;
    }
    if let Ok(raw) = std::env::var("HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = parse_positive_usize(&raw, "HTTP_TIMEOUT_SECS")? as u64;
    }
    if let Ok(agent) = std::env::var("HTTP_USER_AGENT") {
        config.http.user_agent = agent;
    }
    if let Ok(raw) = std::env::var("SERIES_DEFAULT_LIMIT") {
        config.paginate.default_limit = parse_positive_usize(&raw, "SERIES_DEFAULT_LIMIT")?;
    }
    if let Ok(raw) = std::env::var("SERIES_MAX_LIMIT") {
        config.paginate.max_limit = parse_positive_usize(&raw, "SERIES_MAX_LIMIT")?;
    }

    validate_config(&config)?;

    Ok(config)
}
