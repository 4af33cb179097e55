//! CLI configuration: thin wrapper around `casanet_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--hub,
//! --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use casanet_core::{HubConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use casanet_config::{
    Config, Profile, TokenSource, config_path, load_config_or_default, save_config, session_path,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, or `(none)`.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Resolve the token: CLI flag first, then the shared credential chain.
pub fn resolve_token(
    global: &GlobalOpts,
    profile: &Profile,
    profile_name: &str,
) -> Option<(SecretString, TokenSource)> {
    if let Some(token) = global.token.as_ref().filter(|t| !t.is_empty()) {
        return Some((SecretString::from(token.clone()), TokenSource::Flag));
    }
    casanet_config::resolve_token(profile, profile_name)
}

/// Build a `HubConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile the hub URL must come from `--hub`.
pub fn build_hub_config(global: &GlobalOpts, feed: bool) -> Result<HubConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.hub.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // 1. Hub URL (flag > env > profile)
    if let Some(ref hub) = global.hub {
        profile.hub.clone_from(hub);
    }

    // 2. Token
    let token = resolve_token(global, &profile, &profile_name).map(|(token, source)| {
        debug!(profile = %profile_name, %source, "using session token");
        token
    });

    let mut config =
        casanet_config::profile_to_hub_config(&profile, &profile_name, &cfg.defaults, token)?;

    // 3. TLS verification
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 4. Timeout
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    // 5. Push feed only for commands that stream it
    config.feed_enabled = feed && config.feed_enabled;

    Ok(config)
}
