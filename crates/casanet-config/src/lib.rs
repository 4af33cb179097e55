//! Shared configuration for casanet tools.
//!
//! TOML profiles, token resolution (env + keyring + session file +
//! plaintext), and translation to `casanet_core::HubConfig`. The CLI adds
//! `GlobalOpts`-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use casanet_core::{FileSessionStore, HubConfig, SessionManager, TlsVerification};

const KEYRING_SERVICE: &str = "casanet";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
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

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named hub profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Hub base URL (e.g., "https://casanet.local").
    pub hub: String,

    /// Session token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Open the timings push feed (default: true).
    pub feed: Option<bool>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "casanet", "casanet")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("casanet");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Session file (token + profile) for a named profile.
pub fn session_path(profile_name: &str) -> PathBuf {
    let file = format!("{profile_name}.json");
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("sessions").join(&file),
        |dirs| dirs.data_dir().join("sessions").join(&file),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + `CASANET_*` environment variables.
///
/// Nested keys use a double underscore: `CASANET_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CASANET_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    Env,
    Keyring,
    Session,
    Plaintext,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flag => "command line",
            Self::Env => "environment",
            Self::Keyring => "system keyring",
            Self::Session => "session file",
            Self::Plaintext => "config file",
        })
    }
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve a token from the credential chain (no CLI flag step).
///
/// `None` is not an error: the hub may rely on its session cookie, and
/// `login` runs without a token.
pub fn resolve_token(
    profile: &Profile,
    profile_name: &str,
) -> Option<(SecretString, TokenSource)> {
    resolve_token_with(profile, profile_name, &session_path(profile_name), |name| {
        std::env::var(name).ok()
    })
}

/// [`resolve_token`] with an explicit session path and env lookup.
pub fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    session_file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Option<(SecretString, TokenSource)> {
    // 1. Profile's token_env → env var lookup
    if let Some(val) = profile
        .token_env
        .as_deref()
        .and_then(&env)
        .filter(|v| !v.is_empty())
    {
        return Some((SecretString::from(val), TokenSource::Env));
    }

    // 2. System keyring
    if let Ok(secret) =
        keyring_entry(profile_name).and_then(|e| e.get_password().map_err(ConfigError::from))
    {
        return Some((SecretString::from(secret), TokenSource::Keyring));
    }

    // 3. Token saved by the last login
    if session_file.exists() {
        let session = SessionManager::new(Arc::new(FileSessionStore::open(session_file)), true);
        if let Some(token) = session.token() {
            return Some((token, TokenSource::Session));
        }
    }

    // 4. Plaintext in config
    profile
        .token
        .as_ref()
        .filter(|t| !t.is_empty())
        .map(|t| (SecretString::from(t.clone()), TokenSource::Plaintext))
}

/// Store a token for `profile_name` in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── HubConfig translation ───────────────────────────────────────────

/// Build a `HubConfig` from a profile, with a token already resolved.
pub fn profile_to_hub_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    token: Option<SecretString>,
) -> Result<HubConfig, ConfigError> {
    let url = parse_hub_url(&profile.hub)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = HubConfig::new(url);
    config.token = token;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.feed_enabled = profile.feed.unwrap_or(true);
    config.session_path = Some(session_path(profile_name));
    Ok(config)
}

/// Parse a hub URL, accepting a bare host by assuming `https://`.
pub fn parse_hub_url(raw: &str) -> Result<url::Url, ConfigError> {
    let invalid = || ConfigError::Validation {
        field: "hub".into(),
        reason: format!("invalid URL: {raw}"),
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::Validation {
            field: "hub".into(),
            reason: "hub URL is empty".into(),
        });
    }
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    let url = url::Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}
