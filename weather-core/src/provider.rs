use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tracing::info;

use crate::{
    Config,
    auth::{Credentials, HttpAuthenticator},
    error::Result,
    http::{RetryingHttpClient, http_client},
    model::{CityName, WeatherObservation},
    token::TokenStore,
};

pub mod remote;

pub use remote::ApiWeatherProvider;

/// Domain view of the weather API.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Names the API can report on. An empty or failed answer is an error,
    /// since nothing could ever be polled.
    async fn list_supported_cities(&self) -> Result<Vec<String>>;

    /// Current weather for one city, or `None` when it could not be fetched.
    async fn fetch_weather(&self, city: &CityName) -> Option<WeatherObservation>;
}

/// Wire an [`ApiWeatherProvider`] from config.
///
/// The returned provider shares `tokens`; the caller is expected to have
/// committed an initial token (or to accept that the first call will 401 and
/// refresh).
pub fn provider_from_config(
    config: &Config,
    tokens: TokenStore,
    credentials: Credentials,
) -> Result<ApiWeatherProvider> {
    let api = &config.weather_api;
    let http = http_client(api)?;
    let authenticator = Arc::new(HttpAuthenticator::new(http.clone(), &api.base_url));
    let client =
        RetryingHttpClient::new(http, api.base_url.clone(), tokens, authenticator, credentials);
    Ok(ApiWeatherProvider::new(client))
}

/// Build a provider and perform the initial authentication.
///
/// Failing here is fatal: without a first token no data can ever be fetched.
pub async fn connect(config: &Config, credentials: Credentials) -> Result<ApiWeatherProvider> {
    let provider = provider_from_config(config, TokenStore::new(), credentials)?;
    provider.client().authenticate().await?;
    info!(base_url = %config.weather_api.base_url, "authenticated against weather API");
    Ok(provider)
}
