// ── Session persistence ──
//
// Remembers the logged-in profile and, when the hub hands out tokens,
// the session token. Storage is a small key-value capability so the CLI
// persists to a JSON file and tests stay in memory.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use casanet_api::models::User;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Keys the session manager stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum SessionKey {
    ApiToken,
    Profile,
}

/// Key-value storage backing a [`SessionManager`].
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<Value>;
    fn set(&self, key: SessionKey, value: Value) -> Result<(), CoreError>;
    fn remove(&self, key: SessionKey) -> Result<(), CoreError>;
}

// ── MemorySessionStore ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<SessionKey, Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: SessionKey, value: Value) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

// ── FileSessionStore ─────────────────────────────────────────────────

/// JSON object on disk, rewritten on every change.
///
/// A missing file is an empty session. An unreadable one is logged and
/// treated as empty so a corrupt file never blocks logging in again.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileSessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read session file");
                Map::new()
            }
        };
        debug!(path = %path.display(), keys = values.len(), "session store opened");
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), CoreError> {
        let io_err = |e: std::io::Error| CoreError::Config {
            message: format!("cannot write session file {}: {e}", self.path.display()),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(values)
            .map_err(|e| CoreError::Internal(format!("session encode: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
            restrict_permissions(&file).map_err(io_err)?;
            file.write_all(&body).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn with_values<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> (R, Map<String, Value>) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut values);
        (result, values.clone())
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_ref())
            .cloned()
    }

    fn set(&self, key: SessionKey, value: Value) -> Result<(), CoreError> {
        let ((), snapshot) = self.with_values(|values| {
            values.insert(key.to_string(), value);
        });
        self.persist(&snapshot)
    }

    fn remove(&self, key: SessionKey) -> Result<(), CoreError> {
        let (removed, snapshot) = self.with_values(|values| values.remove(key.as_ref()).is_some());
        if removed {
            self.persist(&snapshot)
        } else {
            Ok(())
        }
    }
}

// ── SessionManager ───────────────────────────────────────────────────

/// Login state for one hub.
///
/// With tokens disallowed the hub relies on its session cookie alone:
/// [`token`](Self::token) is always `None` and
/// [`set_token`](Self::set_token) does nothing.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    allow_token: bool,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("allow_token", &self.allow_token)
            .field("logged_on", &self.is_logged_on())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, allow_token: bool) -> Self {
        Self { store, allow_token }
    }

    /// In-memory session, nothing persisted.
    pub fn in_memory(allow_token: bool) -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), allow_token)
    }

    pub fn allow_token(&self) -> bool {
        self.allow_token
    }

    fn stored_token(&self) -> Option<String> {
        self.store
            .get(SessionKey::ApiToken)
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|t| !t.is_empty())
    }

    /// The stored session token, if tokens are allowed and one is set.
    pub fn token(&self) -> Option<SecretString> {
        if !self.allow_token {
            return None;
        }
        self.stored_token().map(SecretString::from)
    }

    pub fn set_token(&self, token: &SecretString) -> Result<(), CoreError> {
        if !self.allow_token {
            debug!("token storage disabled, ignoring token");
            return Ok(());
        }
        self.store.set(
            SessionKey::ApiToken,
            Value::String(token.expose_secret().to_owned()),
        )
    }

    pub fn on_login(&self, profile: &User) -> Result<(), CoreError> {
        let value = serde_json::to_value(profile)
            .map_err(|e| CoreError::Internal(format!("profile encode: {e}")))?;
        self.store.set(SessionKey::Profile, value)?;
        debug!(email = %profile.email, "session started");
        Ok(())
    }

    /// Forget the profile and the token.
    pub fn on_logout(&self) -> Result<(), CoreError> {
        self.store.remove(SessionKey::Profile)?;
        self.store.remove(SessionKey::ApiToken)?;
        debug!("session cleared");
        Ok(())
    }

    pub fn profile(&self) -> Option<User> {
        self.store
            .get(SessionKey::Profile)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// A profile is stored, and so is a token when tokens are in use.
    pub fn is_logged_on(&self) -> bool {
        self.store.get(SessionKey::Profile).is_some()
            && (!self.allow_token || self.stored_token().is_some())
    }
}
