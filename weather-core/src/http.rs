//! Outbound GET calls with the two independent retry budgets.
//!
//! * A `401 Unauthorized` triggers re-authentication, a token commit and a
//!   retry, at most [`RetryPolicy::max_auth_retries`] times per call.
//! * A connection-level failure (refused, timeout, DNS, a body cut short),
//!   including one raised while re-authenticating, is retried after a fixed
//!   backoff, at most [`RetryPolicy::max_transport_retries`] times per call.
//!   Other `reqwest` errors (builder, redirect) fail the call at once.
//!
//! The two counters never share budget.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::{
    auth::{Authenticator, Credentials},
    config::WeatherApiConfig,
    error::{Error, Result},
    token::TokenStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_auth_retries: u32,
    pub max_transport_retries: u32,
    pub transport_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_auth_retries: 3,
            max_transport_retries: 3,
            transport_backoff: Duration::from_secs(1),
        }
    }
}

/// Build the shared `reqwest` client using the configured timeout.
pub fn http_client(config: &WeatherApiConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    authenticator: Arc<dyn Authenticator>,
    credentials: Credentials,
    policy: RetryPolicy,
}

impl RetryingHttpClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        tokens: TokenStore,
        authenticator: Arc<dyn Authenticator>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            tokens,
            authenticator,
            credentials,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Authenticate once, without retries, and commit the token.
    pub async fn authenticate(&self) -> Result<()> {
        let token = self.authenticator.authenticate(&self.credentials).await?;
        self.tokens.set(token);
        Ok(())
    }

    /// GET `path` and decode a JSON body, surfacing every failure as an error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T> {
        let url = join_url(&self.base_url, path);
        let mut auth_retries = 0u32;
        let mut transport_retries = 0u32;
        let mut needs_refresh = false;

        loop {
            if needs_refresh {
                match self.authenticator.authenticate(&self.credentials).await {
                    Ok(token) => {
                        self.tokens.set(token);
                        needs_refresh = false;
                    }
                    Err(err) if err.is_transport() => {
                        if !self.back_off(operation, &mut transport_retries, &err).await {
                            return Err(err.into());
                        }
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            let (status, body) = match self.attempt(&url).await {
                Ok(Attempt::Unauthorized) => {
                    if auth_retries >= self.policy.max_auth_retries {
                        return Err(Error::Unauthorized {
                            operation,
                            attempts: auth_retries + 1,
                        });
                    }
                    auth_retries += 1;
                    debug!(operation, attempt = auth_retries, "unauthorized, refreshing token");
                    needs_refresh = true;
                    continue;
                }
                Ok(Attempt::Completed(status, body)) => (status, body),
                Err(source) if is_transient(&source) => {
                    if !self.back_off(operation, &mut transport_retries, &source).await {
                        return Err(Error::Transport { operation, source });
                    }
                    continue;
                }
                Err(source) => return Err(Error::Transport { operation, source }),
            };

            if !status.is_success() {
                return Err(Error::Status {
                    operation,
                    status,
                    body: truncate_body(&body),
                });
            }

            return serde_json::from_str(&body)
                .map_err(|source| Error::Decode { operation, source });
        }
    }

    /// One GET with the current token, including reading the whole body.
    async fn attempt(&self, url: &str) -> std::result::Result<Attempt, reqwest::Error> {
        let token = self.tokens.get();
        let res = self.http.get(url).bearer_auth(token.as_str()).send().await?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(Attempt::Unauthorized);
        }

        let body = res.text().await?;
        Ok(Attempt::Completed(status, body))
    }

    /// Sleep before the next transport retry; `false` once the budget is spent.
    async fn back_off(
        &self,
        operation: &'static str,
        retries: &mut u32,
        error: &(dyn std::error::Error + Sync),
    ) -> bool {
        if *retries >= self.policy.max_transport_retries {
            return false;
        }
        *retries += 1;
        warn!(
            operation,
            attempt = *retries,
            error = %error,
            "transport failure, backing off"
        );
        tokio::time::sleep(self.policy.transport_backoff).await;
        true
    }

    /// Single-item GET: any failure is logged and becomes `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Option<T> {
        match self.get_json(operation, path).await {
            Ok(value) => Some(value),
            Err(err) => {
                log_failure(operation, &err);
                None
            }
        }
    }

    /// List GET: any failure is logged and becomes an empty `Vec`.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Vec<T> {
        match self.get_json::<Vec<T>>(operation, path).await {
            Ok(items) => items,
            Err(err) => {
                log_failure(operation, &err);
                Vec::new()
            }
        }
    }
}

enum Attempt {
    Unauthorized,
    Completed(StatusCode, String),
}

/// Connection, timeout and mid-body failures; builder or redirect errors are not.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}

fn log_failure(operation: &'static str, err: &Error) {
    match err {
        Error::Status { status, .. } => warn!(operation, %status, "request returned no data"),
        Error::Unauthorized { attempts, .. } => {
            warn!(operation, attempts, "giving up after repeated 401 responses")
        }
        other => error!(operation, error = %other, "request failed"),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_protocol() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_auth_retries, 3);
        assert_eq!(policy.max_transport_retries, 3);
        assert_eq!(policy.transport_backoff, Duration::from_secs(1));
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h:1/", "/api/cities"), "http://h:1/api/cities");
        assert_eq!(join_url("http://h:1", "api/cities"), "http://h:1/api/cities");
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "ė".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
