use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A city name made only of letters, including non-ASCII ones such as `Klaipėda`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CityName(String);

impl CityName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let name = raw.trim();
        if name.is_empty() || !name.chars().all(char::is_alphabetic) {
            return Err(ValidationError::BadFormat(raw.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CityName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CityName> for String {
    fn from(value: CityName) -> Self {
        value.0
    }
}

/// Body of `GET /api/weather/{city}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub city: String,
    pub temperature: i32,
    pub precipitation: i32,
    pub wind_speed: f64,
    #[serde(default)]
    pub summary: Option<String>,
}

/// One city's weather as seen during one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub city: String,
    pub temperature_c: i32,
    pub precipitation_pct: i32,
    pub wind_speed_kph: f64,
    pub summary: String,
    pub observed_at: DateTime<Utc>,
}

impl WeatherObservation {
    pub fn from_report(report: WeatherReport, observed_at: DateTime<Utc>) -> Self {
        Self {
            city: report.city,
            temperature_c: report.temperature,
            precipitation_pct: report.precipitation,
            wind_speed_kph: report.wind_speed,
            summary: report.summary.unwrap_or_default(),
            observed_at,
        }
    }
}

impl fmt::Display for WeatherObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "City: {} Temperature: {} Precipitation: {} WindSpeed: {} Summary: {}",
            self.city, self.temperature_c, self.precipitation_pct, self.wind_speed_kph, self.summary
        )
    }
}

/// Observations collected during a single scheduler tick, in working-set order.
#[derive(Debug, Clone, Default)]
pub struct PollCycle {
    pub number: u64,
    pub started_at: DateTime<Utc>,
    pub observations: Vec<WeatherObservation>,
}

impl PollCycle {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
