//! # PMOCheck Configuration Module
//!
//! This module provides configuration management for PMOCheck, including:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides (prefixed and legacy flat variables)
//! - Type-safe getters for configuration values
//!
//! The configuration is read once at startup and is read-only afterwards. It is
//! owned by the composition root and handed to the crates that need it; each
//! crate adds its own getters through an extension trait (see
//! `pmospotify::SpotifyConfigExt` and `pmogenre::GenreConfigExt`).
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//! let port = config.get_http_port();
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmocheck.yaml");

const ENV_CONFIG_DIR: &str = "PMOCHECK_CONFIG";
const ENV_PREFIX: &str = "PMOCHECK_CONFIG__";

/// Flat environment variables kept for compatibility with existing deployments.
///
/// They are applied before the prefixed overrides, so a prefixed variable wins.
const LEGACY_ENV: &[(&str, &[&str])] = &[
    ("SPOTIFY_CLIENT_ID", &["accounts", "spotify", "client_id"]),
    ("SPOTIFY_CLIENT_SECRET", &["accounts", "spotify", "client_secret"]),
    ("CACHETIMEOUT", &["spotify", "cache", "ttl_secs"]),
    ("PORT", &["host", "http_port"]),
];

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate a getter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> usize {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or($default),
                _ => $default,
            }
        }
    };
}

/// Macro to generate a getter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }
    };
}

/// Configuration manager for PMOCheck
///
/// # Examples
///
/// ```no_run
/// use pmoconfig::Config;
///
/// let config = Config::load_config("")?;
/// println!("HTTP port: {}", config.get_http_port());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    config_dir: PathBuf,
    /// Fichier `config.yaml` effectivement lu
    config_file: Option<PathBuf>,
    data: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    ///
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOCHECK_CONFIG` environment variable
    /// 3. `.pmocheck` in the current directory
    /// 4. `.pmocheck` in the user's home directory
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(env_path);
        }

        if Path::new(".pmocheck").exists() {
            return PathBuf::from(".pmocheck");
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".pmocheck");
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(".pmocheck")
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external `config.yaml` file if present
    /// 4. Applies environment variable overrides
    ///
    /// A missing `config.yaml` is not an error; a malformed one is.
    ///
    /// Nothing is logged here since the subscriber is configured from the
    /// result: call [`Config::log_summary`] once logging is up.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);

        let config_file_path = config_dir.join("config.yaml");
        let external = fs::read_to_string(&config_file_path).ok();

        let mut config = Self::from_parts(config_dir, external.as_deref(), env::vars())?;
        if external.is_some() {
            config.config_file = Some(config_file_path);
        }
        Ok(config)
    }

    /// Logs where the configuration came from
    pub fn log_summary(&self) {
        info!(config_dir=%self.config_dir.display(), "Using config directory");
        match &self.config_file {
            Some(path) => info!(config_file=%path.display(), "Loaded config file"),
            None => info!(
                config_file=%self.config_dir.join("config.yaml").display(),
                "Config file not found, using default embedded config"
            ),
        }
    }

    /// Returns the `config.yaml` that was read, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Builds a configuration from an optional external YAML document and a set
    /// of environment variables
    ///
    /// `load_config` is a thin wrapper around this function; tests use it
    /// directly to stay independent from the process environment.
    pub fn from_parts<I>(config_dir: impl Into<PathBuf>, external: Option<&str>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(yaml) = external {
            let external_value: Value = serde_yaml::from_str(yaml)
                .map_err(|e| anyhow!("Invalid config.yaml: {}", e))?;
            merge_yaml(&mut default_value, &external_value);
        }

        let mut data = Self::lower_keys_value(default_value);
        Self::apply_env_overrides(&mut data, vars);

        Ok(Config {
            config_dir: config_dir.into(),
            config_file: None,
            data,
        })
    }

    /// Returns the directory the configuration was loaded from
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Gets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing the YAML value or an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let mut current = &self.data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    /// Gets an optional, non-empty string value
    ///
    /// Numbers and booleans are rendered as strings, so that an identifier
    /// given through the environment as `123` is still usable.
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Ok(Value::Number(n)) => Some(n.to_string()),
            Ok(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Gets a required string value
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing key when the value is absent or empty.
    pub fn require_string(&self, path: &[&str]) -> Result<String> {
        self.get_string(path)
            .ok_or_else(|| anyhow!("Missing required configuration value {}", path.join(".")))
    }

    /// Gets an optional unsigned integer, accepting numbers and numeric strings
    ///
    /// # Errors
    ///
    /// Returns an error when the value is present but is not a non-negative integer.
    pub fn get_u64(&self, path: &[&str]) -> Result<Option<u64>> {
        match self.get_value(path) {
            Err(_) | Ok(Value::Null) => Ok(None),
            Ok(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| anyhow!("{} must be a non-negative integer", path.join("."))),
            Ok(Value::String(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| anyhow!("{} must be a non-negative integer, got '{}'", path.join("."), s)),
            Ok(_) => Err(anyhow!("{} must be a non-negative integer", path.join("."))),
        }
    }

    /// Gets a required unsigned integer
    pub fn require_u64(&self, path: &[&str]) -> Result<u64> {
        self.get_u64(path)?
            .ok_or_else(|| anyhow!("Missing required configuration value {}", path.join(".")))
    }

    /// Resolves a path relative to the configuration directory
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key);
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        for (name, path) in LEGACY_ENV {
            if let Some((_, value)) = vars.iter().find(|(key, _)| key == name) {
                let _ = Self::set_value_internal(config, path, Self::convert_env_value(value));
            }
        }

        for (key, value) in &vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        let new_val = Self::lower_keys_value(v);
                        new_map.insert(new_key, new_val);
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (3000) if not configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_u64(&["host", "http_port"]) {
            Ok(Some(port)) if port <= u16::MAX as u64 => port as u16,
            Ok(None) => DEFAULT_HTTP_PORT,
            _ => {
                tracing::warn!("Invalid HTTP port, using default {}", DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
        }
    }

    impl_usize_config!(
        get_log_cache_size,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        self.get_string(&["host", "logger", "min_level"])
            .unwrap_or_else(|| DEFAULT_LOG_MIN_LEVEL.to_string())
    }
}

/// Merges external YAML configuration into default configuration
///
/// This function recursively merges two YAML value trees:
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}
