//! CLI-side configuration: thin wrappers over `holectl_config` that fold
//! in the global flags.
//!
//! Core never sees these types -- it receives a host, a credential and a
//! pre-built `ClientConfig`.

use std::time::Duration;

use secrecy::SecretString;

use holectl_core::ClientConfig;

pub use holectl_config::{Config, Profile, config_path, load_config_or_default, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to run one command against one Pi-hole.
pub struct Target {
    pub profile: String,
    pub host: String,
    pub password: SecretString,
    pub client: ClientConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Combine the config file, the active profile, and flag overrides.
///
/// Flags win over the profile; the profile wins over `[defaults]`.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);

    // An explicitly requested profile has to exist.
    if profile.is_none() && global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // 1. Host (flag > env > profile)
    let host = global
        .host
        .clone()
        .or_else(|| profile.map(|p| p.host.clone()))
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| CliError::NoHost {
            path: config_path().display().to_string(),
        })?;

    // 2. Credential (flag/env > profile chain)
    let password = if let Some(ref pw) = global.password {
        SecretString::from(pw.clone())
    } else if let Some(p) = profile {
        holectl_config::resolve_password(p, &profile_name)?
    } else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    // 3. Timeout (flag > profile > defaults)
    let client = match global.timeout {
        Some(secs) => ClientConfig::default().with_timeout(Duration::from_secs(secs)),
        None => match profile {
            Some(p) => holectl_config::profile_to_client_config(p, &cfg.defaults),
            None => ClientConfig::default().with_timeout(Duration::from_secs(cfg.defaults.timeout)),
        },
    };

    if client.timeout.is_zero() {
        return Err(CliError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    Ok(Target {
        profile: profile_name,
        host,
        password,
        client,
    })
}
