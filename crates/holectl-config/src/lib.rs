//! Shared configuration for holectl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `holectl_core::ClientConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use holectl_core::ClientConfig;

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "holectl";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "HOLECTL_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no App Password/API Key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named Pi-hole profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile` when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    5
}

/// A named Pi-hole profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Host name or IP, optionally with a port (e.g., "10.0.0.5:8080").
    pub host: String,

    /// App Password (v6) or API key (v5). Plaintext; prefer keyring or env var.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$HOLECTL_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "holectl", "holectl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("holectl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under
/// `HOLECTL_`-prefixed env vars (`HOLECTL_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HOLECTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name)
        .ok()
        .and_then(|entry| entry.get_password().ok())
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    debug!(profile = profile_name, "password stored in keyring");
    Ok(())
}

/// Resolve the password from the credential chain (no CLI flag step):
/// profile `password_env`, then the system keyring, then plaintext config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        keyring_password,
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Some(val) = env(env_name).filter(|v| !v.is_empty()) {
            debug!(profile = profile_name, source = "env", "password resolved");
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring(profile_name) {
        debug!(profile = profile_name, source = "keyring", "password resolved");
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        debug!(profile = profile_name, source = "config", "password resolved");
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ClientConfig` from a profile, with `defaults` filling gaps.
pub fn profile_to_client_config(profile: &Profile, defaults: &Defaults) -> ClientConfig {
    let secs = profile.timeout.unwrap_or(defaults.timeout);
    ClientConfig::default().with_timeout(Duration::from_secs(secs))
}

/// Check that a profile names a host and a usable timeout.
pub fn validate_profile(profile: &Profile) -> Result<(), ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.timeout == Some(0) {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn profile() -> Profile {
        Profile {
            host: "10.0.0.5".into(),
            password: Some("from-config".into()),
            password_env: Some("PIHOLE_PW".into()),
            timeout: None,
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), profile());
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.profile(None).unwrap().1.host, "10.0.0.5");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.defaults, Defaults::default());
        assert!(loaded.profiles.is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[profiles.lab]\nhost = \"pi.hole\"\ntimeout = 10\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (name, lab) = loaded.profile(Some("lab")).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(lab.timeout, Some(10));
        assert_eq!(loaded.defaults.output, "table");
        assert!(matches!(
            loaded.profile(None),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn env_var_beats_keyring_and_plaintext() {
        let pw = resolve_password_with(
            &profile(),
            "home",
            |var| (var == "PIHOLE_PW").then(|| "from-env".to_owned()),
            |_| Some("from-keyring".to_owned()),
        )
        .unwrap();
        assert_eq!(pw.expose_secret(), "from-env");
    }

    #[test]
    fn keyring_beats_plaintext() {
        let pw = resolve_password_with(&profile(), "home", |_| None, |_| {
            Some("from-keyring".to_owned())
        })
        .unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");
    }

    #[test]
    fn plaintext_is_last_resort() {
        let pw = resolve_password_with(&profile(), "home", |_| None, |_| None).unwrap();
        assert_eq!(pw.expose_secret(), "from-config");

        let bare = Profile {
            host: "10.0.0.5".into(),
            ..Profile::default()
        };
        let err = resolve_password_with(&bare, "home", |_| None, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "home"));
    }

    #[test]
    fn timeout_falls_back_to_defaults() {
        let defaults = Defaults::default();
        assert_eq!(
            profile_to_client_config(&profile(), &defaults).timeout,
            Duration::from_secs(5)
        );

        let slow = Profile {
            timeout: Some(20),
            ..profile()
        };
        assert_eq!(
            profile_to_client_config(&slow, &defaults).timeout,
            Duration::from_secs(20)
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(validate_profile(&profile()).is_ok());
        assert!(validate_profile(&Profile::default()).is_err());

        let instant = Profile {
            timeout: Some(0),
            ..profile()
        };
        assert!(matches!(
            validate_profile(&instant),
            Err(ConfigError::Validation { ref field, .. }) if field == "timeout"
        ));
    }
}
