//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_MAX_PASTE_SIZE, DEFAULT_MAX_TTL, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT,
    DEFAULT_STORAGE_TIMEOUT, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL,
};
use crate::ttl::parse_ttl;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for Ephemera.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub blob_dir: String,
    pub port: u16,
    pub max_upload_size: usize,
    pub max_paste_size: usize,
    pub default_ttl: Duration,
    pub max_ttl: Duration,
    pub sweep_interval: Duration,
    pub storage_timeout: Duration,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_data_path(leaf: &str) -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("ephemera")
        .join(leaf)
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_duration(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(value) => match parse_ttl(&value) {
            Some(parsed) if !parsed.is_zero() => parsed,
            _ => {
                tracing::warn!(
                    "Invalid {}='{}'; falling back to {:?}",
                    name,
                    value,
                    default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        let default_ttl = env_duration("DEFAULT_TTL", DEFAULT_TTL);
        let max_ttl = env_duration("MAX_TTL", DEFAULT_MAX_TTL).max(default_ttl);
        Self {
            db_path: env::var("DB_PATH")
                .map(expand_tilde)
                .unwrap_or_else(|_| default_data_path("db")),
            blob_dir: env::var("BLOB_DIR")
                .map(expand_tilde)
                .unwrap_or_else(|_| default_data_path("blobs")),
            port: env_parsed("PORT", DEFAULT_PORT),
            max_upload_size: env_parsed("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE),
            max_paste_size: env_parsed("MAX_PASTE_SIZE", DEFAULT_MAX_PASTE_SIZE),
            default_ttl,
            max_ttl,
            sweep_interval: env_duration("SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL),
            storage_timeout: env_duration("STORAGE_TIMEOUT", DEFAULT_STORAGE_TIMEOUT),
        }
    }
}
