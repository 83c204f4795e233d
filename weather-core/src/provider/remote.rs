use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    error::{Error, Result},
    http::RetryingHttpClient,
    model::{CityName, WeatherObservation, WeatherReport},
};

use super::WeatherProvider;

const CITIES_PATH: &str = "api/cities";
const WEATHER_PATH: &str = "api/weather";

/// [`WeatherProvider`] backed by the authenticated HTTP API.
#[derive(Debug, Clone)]
pub struct ApiWeatherProvider {
    client: RetryingHttpClient,
}

impl ApiWeatherProvider {
    pub fn new(client: RetryingHttpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RetryingHttpClient {
        &self.client
    }
}

#[async_trait]
impl WeatherProvider for ApiWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn list_supported_cities(&self) -> Result<Vec<String>> {
        let cities: Vec<String> = self.client.get_list("list_supported_cities", CITIES_PATH).await;

        if cities.is_empty() {
            return Err(Error::NoSupportedCities);
        }

        info!(count = cities.len(), "loaded supported cities");
        Ok(cities)
    }

    #[instrument(skip_all, fields(city = %city), level = "debug")]
    async fn fetch_weather(&self, city: &CityName) -> Option<WeatherObservation> {
        let path = format!("{WEATHER_PATH}/{city}");
        let report: WeatherReport = self.client.get_optional("fetch_weather", &path).await?;
        Some(WeatherObservation::from_report(report, Utc::now()))
    }
}
