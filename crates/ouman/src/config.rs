//! CLI configuration -- thin wrapper around `ouman_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--address, --username, --timeout, OUMAN_PASSWORD).

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use ouman_api::TransportConfig;
use ouman_config::ConnectionSettings;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use ouman_config::{Config, Profile, config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// The `--output` flag, else the config default, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build connection settings from the config file, profile, and CLI overrides.
///
/// Flags win over profile values. Without a profile, `--address`,
/// `--username` and `OUMAN_PASSWORD` must supply everything.
pub fn resolve_connection(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ConnectionSettings, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = match config.profile(&profile_name) {
        Ok(profile) => Some(profile),
        // An explicitly requested profile must exist.
        Err(e) if global.profile.is_some() => {
            return Err(CliError::from_config(e, || available_profiles(config)));
        }
        Err(_) => None,
    };
    let to_cli =
        |e: ouman_config::ConfigError| CliError::from_config(e, || available_profiles(config));

    // 1. Address (flag > env > profile)
    let address = global
        .address
        .as_deref()
        .or(profile.map(|p| p.address.as_str()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let base_url = ouman_config::parse_address(address).map_err(to_cli)?;

    // 2. Credentials
    let username = match (&global.username, profile) {
        (Some(username), _) => username.clone(),
        (None, Some(profile)) => {
            ouman_config::resolve_username(profile, &profile_name).map_err(to_cli)?
        }
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };
    let password = match (&global.password, profile) {
        (Some(password), _) => SecretString::from(password.clone()),
        (None, Some(profile)) => {
            ouman_config::resolve_password(profile, &profile_name).map_err(to_cli)?
        }
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };

    // 3. Timeout (flag > profile > defaults)
    let timeout = global
        .timeout
        .or(profile.and_then(|p| p.timeout))
        .unwrap_or(config.defaults.timeout);

    Ok(ConnectionSettings {
        base_url,
        username,
        password,
        transport: TransportConfig::default().with_timeout(Duration::from_secs(timeout)),
    })
}
