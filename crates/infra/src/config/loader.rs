//! Configuration loader
//!
//! ## Loading Strategy
//! 1. If `HEARTH_DB_PATH` is set, configuration comes from the environment
//!    on top of the built-in defaults
//! 2. Otherwise the first probed config file is used (JSON or TOML)
//! 3. With neither, the defaults are used
//!
//! Secrets and provider keys in the environment always override the file,
//! so a checked-in `hearth.toml` can stay free of credentials.
//!
//! ## Environment Variables
//! - `HEARTH_DB_PATH`, `HEARTH_DB_POOL_SIZE`
//! - `TOKEN_ENCRYPTION_KEY`
//! - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`
//! - `APPLE_CALDAV_ENDPOINT`
//! - `SPOONACULAR_API_KEY`, `CALENDARIFIC_API_KEY`
//! - `HEARTH_HTTP_TIMEOUT_SECS`
//! - `HEARTH_SCHEDULER_ENABLED`, `HEARTH_JOB_TIMEOUT_SECS`
//! - `HEARTH_CALENDAR_SWEEP_CRON`, `HEARTH_HOLIDAY_SYNC_CRON`,
//!   `HEARTH_MEAL_PREFETCH_CRON`, `HEARTH_REMINDER_SCAN_CRON`
//!
//! ## File Locations
//! `config.{json,toml}` and `hearth.{json,toml}` in the working directory and
//! up to two parents, then the same names next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use hearth_domain::{Config, HearthError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "hearth.json", "hearth.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `HearthError::Config` when a present source is malformed. A
/// missing source is not an error.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Environment configuration incomplete, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::warn!("No config file found, using defaults");
                    let mut config = Config::default();
                    apply_env_overrides(&mut config)?;
                    Ok(config)
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `HEARTH_DB_PATH` is required; everything else falls back to defaults.
///
/// # Errors
/// Returns `HearthError::Config` if `HEARTH_DB_PATH` is missing or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.database.path = env_var("HEARTH_DB_PATH")?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file, probing standard locations when `path`
/// is `None`. Environment overrides are applied afterwards.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(HearthError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            HearthError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| HearthError::Config(format!("Failed to read config file: {e}")))?;

    let mut config = parse_config(&contents, &config_path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| HearthError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| HearthError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(HearthError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations; returns the first existing file.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.extend([exe_dir.to_path_buf(), exe_dir.join("..")]);
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(size) = env_parse::<u32>("HEARTH_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }
    if let Some(key) = env_opt("TOKEN_ENCRYPTION_KEY") {
        config.security.token_encryption_key = Some(key);
    }

    if let Some(id) = env_opt("GOOGLE_CLIENT_ID") {
        config.google.client_id = Some(id);
    }
    if let Some(secret) = env_opt("GOOGLE_CLIENT_SECRET") {
        config.google.client_secret = Some(secret);
    }
    if let Some(uri) = env_opt("GOOGLE_REDIRECT_URI") {
        config.google.redirect_uri = Some(uri);
    }
    if let Some(endpoint) = env_opt("APPLE_CALDAV_ENDPOINT") {
        config.apple.caldav_endpoint = endpoint;
    }
    if let Some(key) = env_opt("SPOONACULAR_API_KEY") {
        config.spoonacular.api_key = Some(key);
    }
    if let Some(key) = env_opt("CALENDARIFIC_API_KEY") {
        config.calendarific.api_key = Some(key);
    }

    if let Some(secs) = env_parse::<u64>("HEARTH_HTTP_TIMEOUT_SECS")? {
        config.http.timeout_secs = secs;
    }

    let scheduler = &mut config.scheduler;
    scheduler.enabled = env_bool("HEARTH_SCHEDULER_ENABLED", scheduler.enabled);
    if let Some(secs) = env_parse::<u64>("HEARTH_JOB_TIMEOUT_SECS")? {
        scheduler.job_timeout_secs = secs;
    }
    for (key, slot) in [
        ("HEARTH_CALENDAR_SWEEP_CRON", &mut scheduler.calendar_sweep_cron),
        ("HEARTH_HOLIDAY_SYNC_CRON", &mut scheduler.holiday_sync_cron),
        ("HEARTH_MEAL_PREFETCH_CRON", &mut scheduler.meal_prefetch_cron),
        ("HEARTH_REMINDER_SCAN_CRON", &mut scheduler.reminder_scan_cron),
    ] {
        if let Some(expr) = env_opt(key) {
            *slot = expr;
        }
    }

    Ok(())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        HearthError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-empty.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| HearthError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
