// ── Core error types ──
//
// User-facing errors from casanet-core. Consumers never match on HTTP
// plumbing directly; the `From<casanet_api::Error>` impl translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so the last fetch failure can be published on a service's
/// status channel while also being returned to the caller.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach hub at {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Hub returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Could not decode hub response: {message}")]
    Parse { message: String },

    #[error("Not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Could not {action}: {message}")]
    MutationFailed { action: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a failed remote mutation, keeping the hub's reason.
    pub fn mutation(action: impl Into<String>, source: &CoreError) -> Self {
        Self::MutationFailed {
            action: action.into(),
            message: source.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<casanet_api::Error> for CoreError {
    fn from(err: casanet_api::Error) -> Self {
        match err {
            casanet_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            casanet_api::Error::Transport(ref e) => {
                if e.status().map(|s| s.as_u16()) == Some(404) {
                    return CoreError::NotFound {
                        entity_type: "resource".into(),
                        identifier: e.url().map(|u| u.path().to_owned()).unwrap_or_default(),
                    };
                }
                CoreError::Transport {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    reason: e.to_string(),
                }
            }
            casanet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            casanet_api::Error::Tls(msg) => CoreError::Transport {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            casanet_api::Error::Server { status: 404, message } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            casanet_api::Error::Server { status, message } => CoreError::Server { status, message },
            casanet_api::Error::Deserialization { message, body: _ } => CoreError::Parse { message },
            casanet_api::Error::FeedConnect(reason) => CoreError::Transport {
                url: String::new(),
                reason: format!("timings feed: {reason}"),
            },
            casanet_api::Error::FeedParse { message, data: _ } => CoreError::Parse { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_404_becomes_not_found() {
        let err: CoreError = casanet_api::Error::Server {
            status: 404,
            message: "timing not exist".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn auth_error_maps_to_authentication_failed() {
        let err: CoreError = casanet_api::Error::Authentication {
            message: "HTTP 401".into(),
        }
        .into();
        assert!(err.is_auth());
    }

    #[test]
    fn mutation_error_keeps_reason() {
        let cause = CoreError::Server {
            status: 500,
            message: "boom".into(),
        };
        let err = CoreError::mutation("rename device", &cause);
        assert_eq!(err.to_string(), "Could not rename device: Hub returned HTTP 500: boom");
    }
}
