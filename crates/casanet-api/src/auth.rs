// Session authentication
//
// The hub answers a successful login with the user profile in the body
// and the session token in the `api-key` response header. The cookie jar
// also receives the session cookie, so either credential works afterwards.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{HubClient, check_status};
use crate::error::Error;
use crate::models::{LoginRequest, User};
use crate::transport::API_KEY_HEADER;

/// Outcome of a successful login.
#[derive(Debug)]
pub struct LoginResponse {
    pub profile: User,
    /// Present when the hub hands out header tokens.
    pub token: Option<SecretString>,
}

impl HubClient {
    /// Log in with email and password.
    ///
    /// `POST /API/auth/login`
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse, Error> {
        let url = self.api_url("auth/login")?;
        debug!(email, "logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(Error::Transport)?;

        let resp = check_status(resp).await.map_err(|e| match e {
            Error::Server { status, message } => Error::Authentication {
                message: format!("login failed (HTTP {status}): {message}"),
            },
            other => other,
        })?;

        let token = resp
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.to_owned()));

        let body = resp.text().await.map_err(Error::Transport)?;
        let profile: User = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

        debug!(has_token = token.is_some(), "login successful");
        Ok(LoginResponse { profile, token })
    }

    /// End the current session.
    ///
    /// `POST /API/auth/logout`
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url("auth/logout")?;
        debug!("logging out at {}", url);
        self.post_empty(url).await
    }
}
