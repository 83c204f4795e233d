use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::{debug, warn};

use crate::{error::AuthFailure, token::BearerToken};

pub const AUTHENTICATE_PATH: &str = "api/authenticate";

/// User name from configuration plus the password given on the command line.
#[derive(Clone)]
pub struct Credentials {
    pub user_name: String,
    password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Exchanges credentials for a bearer token.
///
/// Implementations never touch the [`TokenStore`](crate::TokenStore); the
/// caller decides when the new token is committed.
#[async_trait]
pub trait Authenticator: Send + Sync + Debug {
    async fn authenticate(&self, credentials: &Credentials) -> Result<BearerToken, AuthFailure>;
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    http: Client,
    url: String,
}

impl HttpAuthenticator {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            url: crate::http::join_url(base_url, AUTHENTICATE_PATH),
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<BearerToken, AuthFailure> {
        debug!(user = %credentials.user_name, "requesting bearer token");

        let res = self
            .http
            .post(&self.url)
            .json(&AuthRequest {
                username: &credentials.user_name,
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(AuthFailure::Transport)?;

        let status = res.status();
        if !status.is_success() {
            warn!(user = %credentials.user_name, %status, "authentication rejected");
            return Err(AuthFailure::Status(status));
        }

        let body: AuthResponse = res.json().await.map_err(AuthFailure::Decode)?;

        match body.token {
            Some(token) if !token.is_empty() => Ok(BearerToken::new(token)),
            _ => {
                warn!(user = %credentials.user_name, "authentication returned no token");
                Err(AuthFailure::EmptyToken)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("user", "hunter2");
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("user"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn authenticate_url_is_joined_once() {
        let auth = HttpAuthenticator::new(Client::new(), "https://weather.example/");
        assert_eq!(auth.url, "https://weather.example/api/authenticate");
    }

    #[test]
    fn auth_response_tolerates_missing_token() {
        let parsed: AuthResponse = serde_json::from_str("{}").expect("valid json");
        assert!(parsed.token.is_none());
    }
}
