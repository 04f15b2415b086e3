use crate::app_config::{AppConfig, Environment};
use crate::{ConfigError, Coordinates};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("RADAR_ENV", "development"))?;
    let log_level = or_default("RADAR_LOG_LEVEL", "info");

    let app_name = or_default("RADAR_APP_NAME", "radar");
    if app_name.trim().is_empty() {
        return Err(invalid("RADAR_APP_NAME", "must be non-empty".to_string()));
    }
    let cache_dir = PathBuf::from(or_default("RADAR_CACHE_DIR", "./.radar"));
    let partners_path = PathBuf::from(or_default("RADAR_PARTNERS_PATH", "./config/partners.yaml"));

    let admin_passcode = or_default("RADAR_ADMIN_PASSCODE", "2003");
    if admin_passcode.chars().count() != 4 {
        return Err(invalid(
            "RADAR_ADMIN_PASSCODE",
            "must be exactly 4 characters".to_string(),
        ));
    }

    let db_max_connections = parse_u32("RADAR_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RADAR_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RADAR_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let storage_url = lookup("RADAR_STORAGE_URL").ok();
    let storage_key = lookup("RADAR_STORAGE_KEY").ok();
    let storage_bucket = or_default("RADAR_STORAGE_BUCKET", "radar-fotos");
    let storage_prefix = or_default("RADAR_STORAGE_PREFIX", "radar");

    let gemini_api_key = lookup("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
    let geocode_model = or_default("RADAR_GEOCODE_MODEL", "gemini-2.5-flash");
    let geocode_fallback_model =
        or_default("RADAR_GEOCODE_FALLBACK_MODEL", "gemini-3-flash-preview");
    let home_region = or_default("RADAR_HOME_REGION", "San Luis Potosí, México");
    let home = Coordinates::new(
        parse_f64("RADAR_HOME_LAT", "22.1567")?,
        parse_f64("RADAR_HOME_LNG", "-100.9855")?,
    );
    if !home.is_valid() {
        return Err(invalid(
            "RADAR_HOME_LAT",
            format!("home coordinate {home} is out of range"),
        ));
    }

    let http_timeout_secs = parse_u64("RADAR_HTTP_TIMEOUT_SECS", "30")?;
    let http_max_retries = parse_u32("RADAR_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_ms = parse_u64("RADAR_HTTP_RETRY_BACKOFF_MS", "500")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        app_name,
        cache_dir,
        partners_path,
        admin_passcode,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        storage_url,
        storage_key,
        storage_bucket,
        storage_prefix,
        gemini_api_key,
        geocode_model,
        geocode_fallback_model,
        home_region,
        home,
        http_timeout_secs,
        http_max_retries,
        http_retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RADAR_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
