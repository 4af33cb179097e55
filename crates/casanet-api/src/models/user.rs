use serde::{Deserialize, Serialize};

/// The logged-in user's profile, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub ignore_tfa: bool,
    /// `"admin"` or `"userAuth"`.
    #[serde(default)]
    pub scope: String,
}

/// Login request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
